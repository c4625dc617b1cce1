//! Built-in catalogue of design-platform operations.

// self
use crate::{
	api::ApiMethod,
	tools::{ParamKind, ParamLocation, ParamSpec, ToolSpec, ToolTarget},
};

const fn param(
	name: &'static str,
	location: ParamLocation,
	kind: ParamKind,
	required: bool,
	description: &'static str,
) -> ParamSpec {
	ParamSpec { name, location, kind, required, description }
}

const CONTINUATION: ParamSpec = param(
	"continuation",
	ParamLocation::Query,
	ParamKind::String,
	false,
	"Continuation token from a previous page.",
);

/// Every tool the gateway serves, in `tools/list` order.
pub const CATALOG: &[ToolSpec] = &[
	ToolSpec {
		name: "auth_status",
		description: "Report whether this session is connected to the design platform.",
		target: ToolTarget::AuthStatus,
		params: &[],
	},
	ToolSpec {
		name: "get_current_user",
		description: "Fetch the profile of the connected user.",
		target: ToolTarget::Api { method: ApiMethod::Get, path: "users/me/profile" },
		params: &[],
	},
	ToolSpec {
		name: "list_designs",
		description: "List designs the connected user can access.",
		target: ToolTarget::Api { method: ApiMethod::Get, path: "designs" },
		params: &[
			param("query", ParamLocation::Query, ParamKind::String, false, "Free-text search."),
			CONTINUATION,
			param(
				"ownership",
				ParamLocation::Query,
				ParamKind::String,
				false,
				"Filter by ownership: any, owned, or shared.",
			),
			param(
				"sort_by",
				ParamLocation::Query,
				ParamKind::String,
				false,
				"Sort order, e.g. modified_descending.",
			),
		],
	},
	ToolSpec {
		name: "get_design",
		description: "Fetch metadata for a single design.",
		target: ToolTarget::Api { method: ApiMethod::Get, path: "designs/{design_id}" },
		params: &[param(
			"design_id",
			ParamLocation::Path,
			ParamKind::String,
			true,
			"Design identifier.",
		)],
	},
	ToolSpec {
		name: "list_design_pages",
		description: "List the pages of a design.",
		target: ToolTarget::Api { method: ApiMethod::Get, path: "designs/{design_id}/pages" },
		params: &[
			param("design_id", ParamLocation::Path, ParamKind::String, true, "Design identifier."),
			param("offset", ParamLocation::Query, ParamKind::Integer, false, "First page index."),
			param(
				"limit",
				ParamLocation::Query,
				ParamKind::Integer,
				false,
				"Maximum number of pages returned.",
			),
		],
	},
	ToolSpec {
		name: "create_design",
		description: "Create a new design, optionally seeded with an uploaded asset.",
		target: ToolTarget::Api { method: ApiMethod::Post, path: "designs" },
		params: &[
			param("title", ParamLocation::Body, ParamKind::String, false, "Design title."),
			param(
				"design_type",
				ParamLocation::Body,
				ParamKind::Object,
				false,
				"Preset or custom dimensions object.",
			),
			param(
				"asset_id",
				ParamLocation::Body,
				ParamKind::String,
				false,
				"Image asset to insert.",
			),
		],
	},
	ToolSpec {
		name: "list_folder_items",
		description: "List the designs, folders, and images inside a folder.",
		target: ToolTarget::Api { method: ApiMethod::Get, path: "folders/{folder_id}/items" },
		params: &[
			param(
				"folder_id",
				ParamLocation::Path,
				ParamKind::String,
				true,
				"Folder identifier, or `root`.",
			),
			CONTINUATION,
			param(
				"item_types",
				ParamLocation::Query,
				ParamKind::String,
				false,
				"Comma-separated filter: design, folder, image.",
			),
		],
	},
	ToolSpec {
		name: "create_folder",
		description: "Create a folder under a parent folder.",
		target: ToolTarget::Api { method: ApiMethod::Post, path: "folders" },
		params: &[
			param("name", ParamLocation::Body, ParamKind::String, true, "Folder name."),
			param(
				"parent_folder_id",
				ParamLocation::Body,
				ParamKind::String,
				true,
				"Parent folder identifier, or `root`.",
			),
		],
	},
	ToolSpec {
		name: "delete_folder",
		description: "Delete a folder; its contents move to the trash.",
		target: ToolTarget::Api { method: ApiMethod::Delete, path: "folders/{folder_id}" },
		params: &[param(
			"folder_id",
			ParamLocation::Path,
			ParamKind::String,
			true,
			"Folder identifier.",
		)],
	},
	ToolSpec {
		name: "get_asset",
		description: "Fetch metadata for an uploaded asset.",
		target: ToolTarget::Api { method: ApiMethod::Get, path: "assets/{asset_id}" },
		params: &[param(
			"asset_id",
			ParamLocation::Path,
			ParamKind::String,
			true,
			"Asset identifier.",
		)],
	},
	ToolSpec {
		name: "create_export_job",
		description: "Start exporting a design to a file format.",
		target: ToolTarget::Api { method: ApiMethod::Post, path: "exports" },
		params: &[
			param("design_id", ParamLocation::Body, ParamKind::String, true, "Design to export."),
			param(
				"format",
				ParamLocation::Body,
				ParamKind::Object,
				true,
				"Export format object, e.g. {\"type\":\"pdf\"}.",
			),
		],
	},
	ToolSpec {
		name: "get_export_job",
		description: "Poll an export job and collect download URLs once it succeeds.",
		target: ToolTarget::Api { method: ApiMethod::Get, path: "exports/{export_id}" },
		params: &[param(
			"export_id",
			ParamLocation::Path,
			ParamKind::String,
			true,
			"Export job identifier.",
		)],
	},
];

/// Looks up a tool by name.
pub fn find(name: &str) -> Option<&'static ToolSpec> {
	CATALOG.iter().find(|spec| spec.name == name)
}
