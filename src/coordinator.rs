//! The peripheral lifecycle: adapter setup, the advertise-while-disconnected
//! policy, GATT and pairing dispatch, and ordered, idempotent teardown.

use futures::{pin_mut, Future, StreamExt};
use log::{debug, error, info, warn};
use std::fmt;

use crate::{
    advertisement::Advertisement,
    agent::{Agent, PairingHandler},
    config::Config,
    device::{ConnectionState, Device},
    gatt::{Application, AttError},
    lifecycle::Slot,
    peripheral::{Adapter, AdapterController, Event, EventReceiver, EventSender, Transport},
    Error,
};

/// Supplies what the peripheral advertises and serves.
pub trait Profile {
    fn advertisement(self: &Self, config: &Config) -> Result<Advertisement, Error>;

    fn application(self: &Self) -> Result<Application, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    AdapterReady,
    Advertising,
    Connected,
    /// Setup failed part way; the loop still runs until shutdown.
    Degraded,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for State {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What ended the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Interrupt,
    Timeout,
}

pub struct Coordinator<T: Transport> {
    config: Config,
    state: State,
    profile: Box<dyn Profile>,
    pairing: Box<dyn PairingHandler>,
    transport: Slot<T>,
    adapter: Slot<AdapterController<T::Adapter>>,
    agent: Slot<Agent>,
    application: Slot<Application>,
    advertisement: Slot<Advertisement>,
    sender: EventSender,
    events: EventReceiver,
}

impl<T: Transport> Coordinator<T> {
    pub fn new<P, H>(transport: T, config: Config, profile: P, pairing: H) -> Self
    where
        P: Profile + 'static,
        H: PairingHandler + 'static,
    {
        let (sender, events) = futures::channel::mpsc::unbounded();
        Coordinator {
            config,
            state: State::Idle,
            profile: Box::new(profile),
            pairing: Box::new(pairing),
            transport: Slot::Active(transport),
            adapter: Slot::Vacant,
            agent: Slot::Vacant,
            application: Slot::Vacant,
            advertisement: Slot::Vacant,
            sender,
            events,
        }
    }

    pub fn state(self: &Self) -> State {
        self.state
    }

    pub fn adapter(self: &Self) -> Option<&AdapterController<T::Adapter>> {
        self.adapter.get()
    }

    pub fn application(self: &Self) -> Option<&Application> {
        self.application.get()
    }

    pub fn advertisement(self: &Self) -> Option<&Advertisement> {
        self.advertisement.get()
    }

    /// Where the transport, or a test, delivers inbound events.
    pub fn event_sender(self: &Self) -> EventSender {
        self.sender.clone()
    }

    /// Acquires the adapter and brings up agent, application and
    /// advertisement. Failures are logged and leave the coordinator degraded.
    ///
    /// Every resource is put in its slot before it is registered, so a setup
    /// cut short by shutdown still releases what it acquired.
    pub async fn start(self: &mut Self) {
        if self.state != State::Idle {
            return;
        }
        let transport = match self.transport.get() {
            Some(transport) => transport,
            None => return,
        };
        let adapter = match transport.default_adapter(self.sender.clone()).await {
            Ok(Some(adapter)) => adapter,
            Ok(None) => {
                warn!("no default adapter found");
                self.state = State::Degraded;
                return;
            }
            Err(err) => {
                error!("no default adapter available: {}", err);
                self.state = State::Degraded;
                return;
            }
        };

        info!("using default adapter '{}'", adapter.path());
        self.adapter = Slot::Active(AdapterController::new(adapter));
        let controller = match self.adapter.get_mut() {
            Some(controller) => controller,
            None => return,
        };
        if let Err(err) = controller.power_on().await {
            error!("failed to power on '{}': {}", controller.path(), err);
        }
        self.state = State::AdapterReady;

        let mut healthy = true;

        self.agent = Slot::Active(Agent::new(
            self.config.agent_path.clone(),
            self.config.io_capability,
        ));
        if let Some(agent) = self.agent.get() {
            if let Err(err) = controller.register_agent(agent).await {
                error!("failed to register agent: {}", err);
                healthy = false;
            }
        }

        match self.profile.advertisement(&self.config) {
            Ok(advertisement) => self.advertisement = Slot::Active(advertisement),
            Err(err) => {
                error!("failed to configure advertisement: {}", err);
                healthy = false;
            }
        }

        match self.profile.application() {
            Ok(application) => self.application = Slot::Active(application),
            Err(err) => {
                error!("failed to build application: {}", err);
                healthy = false;
            }
        }
        if let Some(application) = self.application.get() {
            if let Err(err) = controller.register_application(application).await {
                error!("failed to register application: {}", err);
                healthy = false;
            }
        }

        if let Some(advertisement) = self.advertisement.get() {
            if let Err(err) = controller.start_advertising(advertisement).await {
                error!("failed to start advertising: {}", err);
                healthy = false;
            }
        }

        self.state = if healthy {
            State::Advertising
        } else {
            State::Degraded
        };
        debug!("setup finished, state {}", self.state);
    }

    /// Handles one inbound event to completion.
    pub async fn dispatch(self: &mut Self, event: Event) {
        match event {
            Event::PoweredChanged { adapter, powered } => {
                debug!("powered '{}' ({})", if powered { "on" } else { "off" }, adapter);
            }
            Event::CentralStateChanged(device) => self.on_central_state_changed(device).await,
            Event::Read { request, response } => {
                let result = match self.application.get_mut() {
                    Some(application) => application.on_read_request(&request),
                    None => Err(AttError::Failed),
                };
                if response.send(result).is_err() {
                    debug!("read of {} abandoned by the transport", request.attribute);
                }
            }
            Event::Write { request, response } => {
                let result = match self.application.get_mut() {
                    Some(application) => application.on_write_request(&request),
                    None => Err(AttError::Failed),
                };
                if response.send(result).is_err() {
                    debug!("write of {} abandoned by the transport", request.attribute);
                }
            }
            Event::NotifySubscribe(attribute) => {
                if let Some(application) = self.application.get_mut() {
                    if let Err(err) =
                        application.on_notify_subscribe(attribute.service, attribute.characteristic)
                    {
                        info!("subscription to {} {}", attribute, err);
                    }
                }
            }
            Event::NotifyUnsubscribe(attribute) => {
                if let Some(application) = self.application.get_mut() {
                    application.on_notify_unsubscribe(attribute.service, attribute.characteristic);
                }
            }
            Event::AuthorizationRequest { device, response } => {
                let authorized = self.pairing.on_authorization_request(&device);
                info!(
                    "authorization for '{}' {}",
                    device.display_name(),
                    if authorized { "granted" } else { "denied" }
                );
                if response.send(authorized).is_err() {
                    debug!("authorization request for '{}' was cancelled", device.display_name());
                }
            }
            Event::PasskeyRequest { device, reply } => {
                self.pairing.on_passkey_request(&device, reply);
            }
        }

        self.flush_notifications().await;
    }

    async fn on_central_state_changed(self: &mut Self, device: Device) {
        debug!("{}", device);
        info!(
            "remote central {} is {}",
            device.address, device.connection_state
        );

        let (controller, advertisement) = match (self.adapter.get_mut(), self.advertisement.get()) {
            (Some(controller), Some(advertisement)) => (controller, advertisement),
            _ => return,
        };

        if self.state == State::Connected && device.connection_state == ConnectionState::Connected {
            debug!("'{}' connected while another central is connected", device.display_name());
        }
        if let Err(err) = controller
            .on_central_state_changed(&device, advertisement)
            .await
        {
            error!("failed to update advertising: {}", err);
        }

        self.state = match (self.state, device.connection_state) {
            (State::Advertising, ConnectionState::Connected) => State::Connected,
            (State::Connected, ConnectionState::Disconnected) => State::Advertising,
            (state, _) => state,
        };
    }

    async fn flush_notifications(self: &mut Self) {
        let notifications = match self.application.get_mut() {
            Some(application) => application.take_notifications(),
            None => return,
        };
        let controller = match self.adapter.get() {
            Some(controller) => controller,
            None => return,
        };
        for notification in notifications {
            debug!(
                "notifying <{}> with <{}>",
                notification.characteristic,
                hex::encode(&notification.value)
            );
            if let Err(err) = controller.notify(&notification).await {
                warn!("failed to notify <{}>: {}", notification.characteristic, err);
            }
        }
    }

    /// Runs setup, then the event loop until `interrupt` resolves or the
    /// configured timeout elapses, then the shutdown sequence. The timeout
    /// counts from the call, and either trigger also cuts setup short.
    pub async fn run<F: Future<Output = ()>>(self: &mut Self, interrupt: F) -> Trigger {
        let limit = self.config.timeout;
        let timeout = tokio::time::sleep(limit);
        pin_mut!(timeout);
        pin_mut!(interrupt);

        let cut_short = tokio::select! {
            biased;
            () = &mut interrupt => Some(Trigger::Interrupt),
            () = &mut timeout => Some(Trigger::Timeout),
            () = self.start() => None,
        };

        let trigger = match cut_short {
            Some(trigger) => {
                warn!("setup interrupted in state {}", self.state);
                trigger
            }
            None => loop {
                tokio::select! {
                    biased;
                    () = &mut interrupt => break Trigger::Interrupt,
                    () = &mut timeout => break Trigger::Timeout,
                    Some(event) = self.events.next() => self.dispatch(event).await,
                }
            },
        };
        match trigger {
            Trigger::Interrupt => warn!("received interrupt"),
            Trigger::Timeout => info!("no shutdown requested after {:?}", limit),
        }

        self.shutdown().await;
        trigger
    }

    /// Releases agent, application, advertisement and adapter, in that
    /// order, then stops accepting events. Each step runs at most once, so
    /// calling this again, or after a partial run, is harmless.
    pub async fn shutdown(self: &mut Self) {
        if self.state == State::Stopped {
            debug!("already stopped");
            return;
        }
        self.state = State::ShuttingDown;
        self.pairing.abandon();

        if let Some(agent) = self.agent.release() {
            if let Some(controller) = self.adapter.get_mut() {
                if let Err(err) = controller.unregister_agent(&agent).await {
                    warn!("failed to unregister agent: {}", err);
                }
            }
            debug!("released agent '{}'", agent.path());
        }

        if let Some(application) = self.application.release() {
            if let Some(controller) = self.adapter.get_mut() {
                if let Err(err) = controller.unregister_application(&application).await {
                    warn!("failed to unregister application: {}", err);
                }
            }
            debug!("released application");
        }

        if let Some(advertisement) = self.advertisement.release() {
            if let Some(controller) = self.adapter.get_mut() {
                if let Err(err) = controller.stop_advertising(&advertisement).await {
                    warn!("failed to stop advertising: {}", err);
                }
            }
            debug!("released advertisement");
        }

        if let Some(controller) = self.adapter.release() {
            controller.release().await;
        }

        self.events.close();
        while let Ok(Some(event)) = self.events.try_next() {
            debug!("dropping {:?} on shutdown", event);
        }

        if let Some(transport) = self.transport.release() {
            transport.close().await;
        }

        self.state = State::Stopped;
        info!("stopped");
    }
}
