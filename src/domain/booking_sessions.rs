//! Booking session map: which driver and rider each tracked booking has.
//!
//! Presence in the map is the whole booking lifecycle. An entry is
//! created lazily by the first attach and removed by [`BookingSessions::release`]
//! on a terminal event. Entries are independent of channel state, so a
//! disconnect never touches them.

use std::collections::BTreeMap;

/// Participants bound to one booking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingSession {
    /// Driver vehicle id, set when a driver joins the booking.
    pub vehicle_id: Option<String>,
    /// Rider id, set when a rider joins with this booking id.
    pub rider_id: Option<String>,
}

/// Booking id → [`BookingSession`].
#[derive(Debug, Default)]
pub struct BookingSessions {
    sessions: BTreeMap<String, BookingSession>,
}

impl BookingSessions {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a driver to `booking_id`, creating the session if needed.
    pub fn attach_driver(&mut self, booking_id: &str, vehicle_id: &str) {
        self.entry(booking_id).vehicle_id = Some(vehicle_id.to_string());
    }

    /// Binds a rider to `booking_id`, creating the session if needed.
    pub fn attach_rider(&mut self, booking_id: &str, rider_id: &str) {
        self.entry(booking_id).rider_id = Some(rider_id.to_string());
    }

    /// Returns the vehicle bound to `booking_id`.
    #[must_use]
    pub fn driver_of(&self, booking_id: &str) -> Option<&str> {
        self.sessions
            .get(booking_id)
            .and_then(|s| s.vehicle_id.as_deref())
    }

    /// Returns the rider bound to `booking_id`.
    #[must_use]
    pub fn rider_of(&self, booking_id: &str) -> Option<&str> {
        self.sessions
            .get(booking_id)
            .and_then(|s| s.rider_id.as_deref())
    }

    /// Stops tracking `booking_id`. Releasing an unknown booking is a no-op.
    ///
    /// Returns the session that was removed, if any.
    pub fn release(&mut self, booking_id: &str) -> Option<BookingSession> {
        self.sessions.remove(booking_id)
    }

    /// Booking ids with a driver bound, in key order.
    ///
    /// This is the set reported as `activeBookings`: a booking only a
    /// rider has joined is tracked but not yet listed.
    #[must_use]
    pub fn driver_bookings(&self) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|(_, s)| s.vehicle_id.is_some())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of tracked bookings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no booking is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn entry(&mut self, booking_id: &str) -> &mut BookingSession {
        self.sessions.entry(booking_id.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_then_lookup() {
        let mut sessions = BookingSessions::new();
        sessions.attach_driver("B1", "V1");
        sessions.attach_rider("B1", "U1");

        assert_eq!(sessions.driver_of("B1"), Some("V1"));
        assert_eq!(sessions.rider_of("B1"), Some("U1"));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn release_clears_both_participants() {
        let mut sessions = BookingSessions::new();
        sessions.attach_driver("B1", "V1");
        sessions.attach_rider("B1", "U1");

        assert!(sessions.release("B1").is_some());
        assert_eq!(sessions.driver_of("B1"), None);
        assert_eq!(sessions.rider_of("B1"), None);
        assert!(sessions.is_empty());
    }

    #[test]
    fn release_of_unknown_booking_is_noop() {
        let mut sessions = BookingSessions::new();
        sessions.attach_driver("B1", "V1");

        assert!(sessions.release("B2").is_none());
        assert!(sessions.release("B2").is_none());
        assert_eq!(sessions.driver_of("B1"), Some("V1"));
    }

    #[test]
    fn reattach_is_idempotent() {
        let mut sessions = BookingSessions::new();
        sessions.attach_driver("B1", "V1");
        sessions.attach_driver("B1", "V1");
        assert_eq!(sessions.driver_of("B1"), Some("V1"));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn rider_only_booking_is_not_listed_as_active() {
        let mut sessions = BookingSessions::new();
        sessions.attach_rider("B1", "U1");
        sessions.attach_driver("B2", "V2");
        assert_eq!(sessions.driver_bookings(), vec!["B2"]);
    }
}
