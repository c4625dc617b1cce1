//! Per-session singleflight guards shared by the gate's flows.

// self
use crate::{_prelude::*, auth::SessionId};

pub(crate) type FlowGuards = Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>;

/// Returns (and creates on demand) the singleflight guard for a session.
pub(crate) fn flow_guard(guards: &FlowGuards, session: &SessionId) -> Arc<AsyncMutex<()>> {
	let mut guards = guards.lock();

	guards.entry(session.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Drops the session's guard entry once no other task is holding or waiting on it.
///
/// Callers pass back the handle from [`flow_guard`] after releasing the lock.
pub(crate) fn release_guard(
	guards: &FlowGuards,
	session: &SessionId,
	guard: Arc<AsyncMutex<()>>,
) {
	let mut guards = guards.lock();

	// One reference lives in the map and one is `guard`.
	if Arc::strong_count(&guard) == 2
		&& guards.get(session).is_some_and(|entry| Arc::ptr_eq(entry, &guard))
	{
		guards.remove(session);
	}
}

/// Returns `true` while some task holds the session's guard.
pub(crate) fn is_locked(guards: &FlowGuards, session: &SessionId) -> bool {
	let guard = guards.lock().get(session).cloned();

	guard.is_some_and(|guard| guard.try_lock().is_none())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn guard_is_shared_per_session() {
		let guards = FlowGuards::default();
		let session = SessionId::new("s1").expect("Session fixture should be valid.");
		let other = SessionId::new("s2").expect("Session fixture should be valid.");
		let first = flow_guard(&guards, &session);

		assert!(Arc::ptr_eq(&first, &flow_guard(&guards, &session)));
		assert!(!Arc::ptr_eq(&first, &flow_guard(&guards, &other)));

		let held = first.lock().await;

		assert!(is_locked(&guards, &session));
		assert!(!is_locked(&guards, &other));

		drop(held);

		assert!(!is_locked(&guards, &session));
	}

	#[tokio::test]
	async fn released_guard_is_pruned_only_when_unshared() {
		let guards = FlowGuards::default();
		let session = SessionId::new("s1").expect("Session fixture should be valid.");
		let leader = flow_guard(&guards, &session);
		let waiter = flow_guard(&guards, &session);

		release_guard(&guards, &session, leader);

		assert_eq!(guards.lock().len(), 1);

		release_guard(&guards, &session, waiter);

		assert!(guards.lock().is_empty());
	}
}
