//! Event dispatcher: the relay protocol.
//!
//! [`Dispatcher`] owns the [`RelayState`] behind one lock. Every inbound
//! event is handled to completion under a single acquisition, so handlers
//! that read then write (cancel, emergency stop) cannot interleave with
//! another channel's mutation of the same booking. Delivery never waits,
//! so no handler suspends while holding the lock.
//!
//! Routing degrades instead of failing: a missing identifier skips only
//! the routing step that needs it, and an unknown booking still gets its
//! broadcast.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::domain::ride_event::{
    DriverArrivedAtPickup, EmergencyStopNotice, OtpVerificationStatus, RideCancellation,
    RideCompletedNotification, RideStatusChanged, iso_timestamp,
};
use crate::domain::room_router::{USERS_GROUP, booking_group, driver_group, user_group};
use crate::domain::{ActiveConnections, ChannelId, OutboundFrame, RelayState, RideEvent};
use crate::ws::messages::{
    DriverArrived, InboundEvent, JoinBooking, JoinUser, LocationRequest, OtpVerified,
    RideCompleted, RideStatusUpdate, RiderAction,
};

const OTP_OK_MESSAGE: &str = "OTP verified successfully! Your ride has started.";
const OTP_FAILED_MESSAGE: &str = "OTP verification failed.";
const ARRIVED_MESSAGE: &str = "Your driver has arrived at the pickup location";
const COMPLETED_MESSAGE: &str = "Your ride has been completed successfully";
const CANCEL_MESSAGE: &str = "Ride Cancelled By User";
const CANCELLED_MESSAGE: &str = "Ride cancelled by user";
const EMERGENCY_MESSAGE: &str = "Emergency stop triggered by user";
const EMERGENCY_STATUS_MESSAGE: &str = "Emergency stop triggered";

/// Routes inbound events between drivers and riders.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: Arc<Mutex<RelayState>>,
    outbound_capacity: usize,
}

impl Dispatcher {
    /// Creates a dispatcher with empty relay tables.
    ///
    /// `outbound_capacity` bounds each connection's frame queue.
    #[must_use]
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(RelayState::new())),
            outbound_capacity: outbound_capacity.max(1),
        }
    }

    /// Registers a new connection and returns its handle together with
    /// the queue its writer must drain.
    pub async fn connect(&self) -> (ChannelId, mpsc::Receiver<OutboundFrame>) {
        let channel = ChannelId::new();
        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        self.state.lock().await.connect(channel, tx);
        tracing::info!(%channel, "client connected");
        (channel, rx)
    }

    /// Cleans up after a closed connection.
    ///
    /// Only the registry and group memberships are pruned; bookings the
    /// channel took part in stay tracked.
    pub async fn disconnect(&self, channel: ChannelId) {
        self.state.lock().await.disconnect(channel);
        tracing::info!(%channel, "client disconnected");
    }

    /// Decodes a text frame and dispatches it. Undecodable frames are
    /// logged and dropped.
    pub async fn handle_text(&self, channel: ChannelId, text: &str) {
        match InboundEvent::parse(text) {
            Ok(event) => self.dispatch(channel, event).await,
            Err(err) => tracing::warn!(%channel, error = %err, "dropping inbound frame"),
        }
    }

    /// Applies one inbound event from `channel`.
    pub async fn dispatch(&self, channel: ChannelId, event: InboundEvent) {
        let mut state = self.state.lock().await;
        tracing::debug!(%channel, event = event.name(), "dispatching");
        match event {
            InboundEvent::JoinDriver { vehicle_id } => {
                join_driver(&mut state, channel, vehicle_id);
            }
            InboundEvent::JoinUser(join) => join_user(&mut state, channel, join),
            InboundEvent::JoinBooking(join) => join_booking(&mut state, channel, join),
            InboundEvent::SendLocation(data) => {
                tracing::debug!(
                    %channel,
                    vehicle_id = ?data.get("vehicleId"),
                    "location update"
                );
                state.broadcast(USERS_GROUP, &RideEvent::Location(data), None);
            }
            InboundEvent::OtpVerified(otp) => otp_verified(&state, channel, otp),
            InboundEvent::RideStatusUpdate(update) => ride_status_update(&state, channel, update),
            InboundEvent::DriverArrived(arrived) => driver_arrived(&state, channel, arrived),
            InboundEvent::RideCompleted(done) => ride_completed(&mut state, channel, done),
            InboundEvent::RequestDriverLocation(request) => {
                request_driver_location(&state, request);
            }
            InboundEvent::CancelRide(action) => cancel_ride(&mut state, action),
            InboundEvent::EmergencyStop(action) => emergency_stop(&mut state, action),
            InboundEvent::GetActiveConnections => {
                let info = RideEvent::ActiveConnectionsInfo(state.snapshot());
                state.send_to(channel, &info);
            }
        }
    }

    /// Current drivers, rider count and tracked bookings.
    pub async fn active_connections(&self) -> ActiveConnections {
        self.state.lock().await.snapshot()
    }

    /// Sends `event` to every live connection. Returns how many accepted it.
    pub async fn emit_to_all(&self, event: &RideEvent) -> usize {
        self.state.lock().await.emit_to_all(event)
    }

    /// Sends `event` to every member of the booking's group.
    ///
    /// Entry point for collaborators outside the relay that need to
    /// notify a booking's participants. Returns how many accepted it.
    pub async fn notify_booking(&self, booking_id: &str, event: &RideEvent) -> usize {
        self.state
            .lock()
            .await
            .broadcast(&booking_group(booking_id), event, None)
    }
}

fn join_driver(state: &mut RelayState, channel: ChannelId, vehicle_id: Option<String>) {
    let Some(vehicle_id) = vehicle_id else {
        tracing::debug!(%channel, "joinDriver without vehicle id");
        return;
    };
    state.registry_mut().bind_driver(&vehicle_id, channel);
    state.join(channel, &driver_group(&vehicle_id));
    tracing::info!(%channel, %vehicle_id, "driver joined");
}

fn join_user(state: &mut RelayState, channel: ChannelId, join: JoinUser) {
    if let Some(user_id) = join.user_id.as_deref() {
        state.registry_mut().bind_rider(user_id, channel);
        state.join(channel, &user_group(user_id));
    }
    state.join(channel, USERS_GROUP);

    if let Some(booking_id) = join.booking_id.as_deref() {
        if let Some(user_id) = join.user_id.as_deref() {
            state.sessions_mut().attach_rider(booking_id, user_id);
        }
        state.join(channel, &booking_group(booking_id));
    }
    tracing::info!(
        %channel,
        user_id = ?join.user_id,
        booking_id = ?join.booking_id,
        "rider joined"
    );
}

fn join_booking(state: &mut RelayState, channel: ChannelId, join: JoinBooking) {
    let Some(booking_id) = join.booking_id.as_deref() else {
        tracing::debug!(%channel, "joinBooking without booking id");
        return;
    };
    if let Some(vehicle_id) = join.vehicle_id.as_deref() {
        state.sessions_mut().attach_driver(booking_id, vehicle_id);
    }
    state.join(channel, &booking_group(booking_id));
    tracing::info!(%channel, %booking_id, vehicle_id = ?join.vehicle_id, "driver joined booking");
}

fn otp_verified(state: &RelayState, channel: ChannelId, otp: OtpVerified) {
    let default_message = if otp.otp_verified {
        OTP_OK_MESSAGE
    } else {
        OTP_FAILED_MESSAGE
    };
    let status = OtpVerificationStatus {
        booking_id: otp.booking_id.clone(),
        vehicle_id: otp.vehicle_id,
        otp_verified: otp.otp_verified,
        message: otp.message.unwrap_or_else(|| default_message.to_string()),
        timestamp: iso_timestamp(),
    };
    tracing::info!(
        %channel,
        booking_id = ?otp.booking_id,
        verified = otp.otp_verified,
        "otp verification"
    );

    if let Some(booking_id) = otp.booking_id.as_deref() {
        let event = RideEvent::OtpVerificationStatus(status.clone());
        state.broadcast(&booking_group(booking_id), &event, Some(channel));
    }
    // Riders on older clients only listen on the shared group.
    let fallback = RideEvent::OtpVerificationStatus(OtpVerificationStatus {
        timestamp: iso_timestamp(),
        ..status
    });
    state.broadcast(USERS_GROUP, &fallback, None);
}

fn ride_status_update(state: &RelayState, channel: ChannelId, update: RideStatusUpdate) {
    let Some(booking_id) = update.booking_id else {
        return;
    };
    tracing::info!(%channel, %booking_id, status = ?update.status, "ride status update");
    let event = RideEvent::RideStatusChanged(RideStatusChanged {
        booking_id: booking_id.clone(),
        vehicle_id: update.vehicle_id,
        status: update.status,
        message: update.message,
        timestamp: iso_timestamp(),
    });
    state.broadcast(&booking_group(&booking_id), &event, Some(channel));
}

fn driver_arrived(state: &RelayState, channel: ChannelId, arrived: DriverArrived) {
    let Some(booking_id) = arrived.booking_id else {
        return;
    };
    tracing::info!(%channel, %booking_id, "driver arrived at pickup");
    let event = RideEvent::DriverArrivedAtPickup(DriverArrivedAtPickup {
        booking_id: booking_id.clone(),
        vehicle_id: arrived.vehicle_id,
        location: arrived.location,
        message: ARRIVED_MESSAGE.to_string(),
        timestamp: iso_timestamp(),
    });
    state.broadcast(&booking_group(&booking_id), &event, Some(channel));
}

fn ride_completed(state: &mut RelayState, channel: ChannelId, done: RideCompleted) {
    let Some(booking_id) = done.booking_id else {
        return;
    };
    tracing::info!(%channel, %booking_id, "ride completed");
    let event = RideEvent::RideCompletedNotification(RideCompletedNotification {
        booking_id: booking_id.clone(),
        vehicle_id: done.vehicle_id,
        completion_data: done.completion_data,
        message: COMPLETED_MESSAGE.to_string(),
        timestamp: iso_timestamp(),
    });
    state.broadcast(&booking_group(&booking_id), &event, Some(channel));
    state.sessions_mut().release(&booking_id);
}

fn request_driver_location(state: &RelayState, request: LocationRequest) {
    let Some(booking_id) = request.booking_id else {
        return;
    };
    let driver_channel = state
        .sessions()
        .driver_of(&booking_id)
        .and_then(|vehicle_id| state.registry().lookup_driver_channel(vehicle_id));
    if let Some(driver_channel) = driver_channel {
        state.send_to(driver_channel, &RideEvent::LocationRequested { booking_id });
    }
}

fn cancel_ride(state: &mut RelayState, action: RiderAction) {
    let Some(booking_id) = action.booking_id else {
        return;
    };
    let vehicle_id = state.sessions().driver_of(&booking_id).map(str::to_string);
    let group = booking_group(&booking_id);

    let cancellation = |default_message: &str| RideCancellation {
        booking_id: booking_id.clone(),
        user_id: action.user_id.clone(),
        vehicle_id: vehicle_id.clone(),
        message: action
            .message
            .clone()
            .unwrap_or_else(|| default_message.to_string()),
        timestamp: iso_timestamp(),
        cancelled_by: "user",
    };
    let events = [
        RideEvent::CancelRide(cancellation(CANCEL_MESSAGE)),
        RideEvent::RideCancelled(cancellation(CANCELLED_MESSAGE)),
        RideEvent::RideStatusChanged(RideStatusChanged {
            booking_id: booking_id.clone(),
            vehicle_id: vehicle_id.clone(),
            status: Some("cancelled".to_string()),
            message: Some(
                action
                    .message
                    .clone()
                    .unwrap_or_else(|| CANCELLED_MESSAGE.to_string()),
            ),
            timestamp: iso_timestamp(),
        }),
    ];
    for event in &events {
        state.broadcast(&group, event, None);
    }

    tracing::info!(
        %booking_id,
        user_id = ?action.user_id,
        vehicle_id = ?vehicle_id,
        "ride cancelled by rider"
    );
    state.sessions_mut().release(&booking_id);
}

fn emergency_stop(state: &mut RelayState, action: RiderAction) {
    let Some(booking_id) = action.booking_id else {
        return;
    };
    let vehicle_id = state.sessions().driver_of(&booking_id).map(str::to_string);
    let group = booking_group(&booking_id);

    let notice = || EmergencyStopNotice {
        booking_id: booking_id.clone(),
        user_id: action.user_id.clone(),
        vehicle_id: vehicle_id.clone(),
        message: action
            .message
            .clone()
            .unwrap_or_else(|| EMERGENCY_MESSAGE.to_string()),
        timestamp: iso_timestamp(),
    };
    let events = [
        RideEvent::EmergencyStop(notice()),
        RideEvent::EmergencyStopTriggered(notice()),
        RideEvent::RideStatusChanged(RideStatusChanged {
            booking_id: booking_id.clone(),
            vehicle_id: vehicle_id.clone(),
            status: Some("emergency_stopped".to_string()),
            message: Some(
                action
                    .message
                    .clone()
                    .unwrap_or_else(|| EMERGENCY_STATUS_MESSAGE.to_string()),
            ),
            timestamp: iso_timestamp(),
        }),
    ];
    for event in &events {
        state.broadcast(&group, event, None);
    }

    tracing::warn!(
        %booking_id,
        user_id = ?action.user_id,
        vehicle_id = ?vehicle_id,
        "emergency stop triggered"
    );
    state.sessions_mut().release(&booking_id);
}
