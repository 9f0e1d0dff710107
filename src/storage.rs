use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SESSION_KEY: &str = "crossword-session";
pub const PLAYER_KEY: &str = "crossword-player";

/// Snapshot of an in-progress solve, written on every mutation so a page
/// reload resumes where the player left off. The countdown is stored as the
/// remaining seconds at save time plus the save instant, and re-derived
/// against the wall clock on rehydration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub crossword_id: u32,
    pub letters: Vec<Vec<Option<char>>>,
    pub remaining_secs: u32,
    pub saved_at: DateTime<Utc>,
}

impl SavedSession {
    /// Remaining countdown seconds as of `now`. Time spent away from the
    /// page keeps counting down; a clock that appears to have gone backwards
    /// grants nothing extra.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = (now - self.saved_at).num_seconds().max(0) as u64;
        self.remaining_secs
            .saturating_sub(elapsed.min(u32::MAX as u64) as u32)
    }
}

/// Durable client-side store for ephemeral UI state. The crossword page
/// talks to storage only through this port.
pub trait SessionStore {
    fn load(&self) -> Option<SavedSession>;
    fn save(&self, session: &SavedSession);
    fn clear(&self);
}

/// `localStorage`-backed store. Outside the browser every operation is a
/// no-op, matching a user agent with storage disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStore;

#[cfg(feature = "hydrate")]
fn raw_storage() -> Option<web_sys::Storage> {
    leptos::leptos_dom::helpers::window().local_storage().ok().flatten()
}

impl SessionStore for LocalStore {
    fn load(&self) -> Option<SavedSession> {
        #[cfg(feature = "hydrate")]
        {
            let raw = raw_storage()?.get_item(SESSION_KEY).ok().flatten()?;
            return serde_json::from_str(&raw).ok();
        }
        #[cfg(not(feature = "hydrate"))]
        None
    }

    fn save(&self, session: &SavedSession) {
        #[cfg(feature = "hydrate")]
        if let (Some(storage), Ok(raw)) = (raw_storage(), serde_json::to_string(session)) {
            let _ = storage.set_item(SESSION_KEY, &raw);
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = session;
    }

    fn clear(&self) {
        #[cfg(feature = "hydrate")]
        if let Some(storage) = raw_storage() {
            let _ = storage.remove_item(SESSION_KEY);
        }
    }
}

/// The player's display name, kept across pages. Plain UI state; identity is
/// handled elsewhere.
pub fn load_player_name() -> Option<String> {
    #[cfg(feature = "hydrate")]
    {
        return raw_storage()?.get_item(PLAYER_KEY).ok().flatten();
    }
    #[cfg(not(feature = "hydrate"))]
    None
}

pub fn save_player_name(name: &str) {
    #[cfg(feature = "hydrate")]
    if let Some(storage) = raw_storage() {
        let _ = storage.set_item(PLAYER_KEY, name);
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = name;
}

/// Current wall-clock time. Browser builds go through `Date.now()`; server
/// builds use the system clock.
pub fn now_utc() -> DateTime<Utc> {
    #[cfg(feature = "hydrate")]
    {
        use chrono::TimeZone;
        return chrono::Utc
            .timestamp_millis_opt(js_sys::Date::now() as i64)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    }
    #[cfg(not(feature = "hydrate"))]
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;

    // In-memory stand-in for localStorage.
    #[derive(Default)]
    struct MemoryStore {
        slot: RefCell<Option<SavedSession>>,
    }

    impl SessionStore for MemoryStore {
        fn load(&self) -> Option<SavedSession> {
            self.slot.borrow().clone()
        }

        fn save(&self, session: &SavedSession) {
            *self.slot.borrow_mut() = Some(session.clone());
        }

        fn clear(&self) {
            *self.slot.borrow_mut() = None;
        }
    }

    fn session_at(remaining_secs: u32, saved_at: DateTime<Utc>) -> SavedSession {
        SavedSession {
            crossword_id: 1,
            letters: vec![vec![Some('A'), None], vec![None, Some('B')]],
            remaining_secs,
            saved_at,
        }
    }

    #[test]
    fn test_remaining_is_wall_clock_adjusted() {
        let saved_at = Utc.with_ymd_and_hms(2025, 10, 31, 18, 0, 0).unwrap();
        let session = session_at(120, saved_at);

        assert_eq!(session.remaining_at(saved_at), 120);
        assert_eq!(
            session.remaining_at(saved_at + chrono::Duration::seconds(30)),
            90
        );
        // Past the deadline the countdown bottoms out at zero.
        assert_eq!(
            session.remaining_at(saved_at + chrono::Duration::seconds(600)),
            0
        );
        // A clock running backwards does not refund time.
        assert_eq!(
            session.remaining_at(saved_at - chrono::Duration::seconds(30)),
            120
        );
    }

    #[test]
    fn test_store_round_trip() {
        let store = MemoryStore::default();
        assert_eq!(store.load(), None);

        let session = session_at(45, Utc.with_ymd_and_hms(2025, 10, 31, 18, 0, 0).unwrap());
        store.save(&session);
        assert_eq!(store.load(), Some(session));

        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_saved_session_serde_round_trip() {
        let session = session_at(45, Utc.with_ymd_and_hms(2025, 10, 31, 18, 0, 0).unwrap());
        let raw = serde_json::to_string(&session).unwrap();
        let parsed: SavedSession = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, session);
    }
}
