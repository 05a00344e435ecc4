//! Versioned self-clearing values.
//!
//! A [`Pulse`] models a "just happened" value: the most recent key press or
//! text input is visible to pollers for a short window (~80 ms) and then
//! reverts to empty.  The engine schedules a deferred clear for every event;
//! the version counter makes sure a *stale* clear cannot stomp a value that
//! a newer event set inside the delay window.
//!
//! # Why a version counter?
//!
//! A naive implementation would be "set the value, then clear it 80 ms
//! later".  Now press two keys 50 ms apart: the clear scheduled for the
//! first press fires 30 ms after the second press and wrongly erases it.
//! With a version counter, each `set` bumps the version and every scheduled
//! clear remembers the version it belongs to.  When a clear fires it
//! compares versions: if a newer event has arrived, the clear is a no-op
//! and the newer event's own clear takes over.
//!
//! The type holds no timer itself; the engine owns the scheduling so that
//! expiry tasks can be tied to the engine's lifetime.

/// A value plus a monotonically increasing version, cleared only by a
/// matching [`Pulse::expire`] call.
#[derive(Debug)]
pub struct Pulse<T> {
    value: Option<T>,
    version: u64,
}

impl<T> Default for Pulse<T> {
    fn default() -> Self {
        Self {
            value: None,
            version: 0,
        }
    }
}

impl<T> Pulse<T> {
    /// Stores `value` and returns the version a deferred clear must present
    /// to [`Pulse::expire`].
    pub fn set(&mut self, value: T) -> u64 {
        self.version = self.version.wrapping_add(1);
        self.value = Some(value);
        self.version
    }

    /// Clears the value if `version` is still current.
    ///
    /// Returns `true` if the value was cleared, `false` if a newer `set`
    /// superseded this expiry.
    pub fn expire(&mut self, version: u64) -> bool {
        if self.version == version {
            self.value = None;
            true
        } else {
            false
        }
    }

    /// The current value, if the window has not elapsed.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Unconditionally clears the value without advancing the version.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_expire_clears() {
        // Arrange
        let mut pulse = Pulse::default();
        let v = pulse.set('a');
        assert_eq!(pulse.get(), Some(&'a'));

        // Act
        let cleared = pulse.expire(v);

        // Assert
        assert!(cleared);
        assert_eq!(pulse.get(), None);
    }

    #[test]
    fn test_stale_expire_is_ignored() {
        // Arrange
        let mut pulse = Pulse::default();
        let v1 = pulse.set('a');
        let _v2 = pulse.set('b');

        // Act – the clear scheduled for 'a' fires after 'b' arrived
        let cleared = pulse.expire(v1);

        // Assert
        assert!(!cleared);
        assert_eq!(pulse.get(), Some(&'b'));
    }

    #[test]
    fn test_expire_is_single_use() {
        // Arrange
        let mut pulse = Pulse::default();
        let v = pulse.set('a');
        assert!(pulse.expire(v));

        // Act – a second fire with the same version finds the value gone
        let cleared = pulse.expire(v);

        // Assert – no panic, nothing resurrected
        assert!(cleared);
        assert_eq!(pulse.get(), None);
    }

    #[test]
    fn test_reset_keeps_version_monotonic() {
        // Arrange
        let mut pulse = Pulse::default();
        let v1 = pulse.set('a');

        // Act
        pulse.reset();
        let v2 = pulse.set('b');

        // Assert
        assert!(v2 > v1);
        assert_eq!(pulse.get(), Some(&'b'));
    }
}
