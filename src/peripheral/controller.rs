use log::{debug, info};

use super::Adapter;
use crate::{
    advertisement::Advertisement,
    agent::Agent,
    device::{ConnectionState, Device},
    gatt::{Application, Notification},
    Error,
};

/// Owns an adapter and tracks what is registered with it, so that every
/// start/stop and register/unregister pair is idempotent.
#[derive(Debug)]
pub struct AdapterController<A: Adapter> {
    adapter: A,
    agent_registered: bool,
    application_registered: bool,
    advertising: bool,
}

impl<A: Adapter> AdapterController<A> {
    pub fn new(adapter: A) -> Self {
        AdapterController {
            adapter,
            agent_registered: false,
            application_registered: false,
            advertising: false,
        }
    }

    pub fn path(self: &Self) -> &str {
        self.adapter.path()
    }

    pub fn is_advertising(self: &Self) -> bool {
        self.advertising
    }

    pub fn is_application_registered(self: &Self) -> bool {
        self.application_registered
    }

    pub fn is_agent_registered(self: &Self) -> bool {
        self.agent_registered
    }

    /// Requests power on unless the adapter already reports it.
    pub async fn power_on(self: &Self) -> Result<(), Error> {
        if self.adapter.is_powered().await? {
            return Ok(());
        }
        debug!("powering on '{}'", self.path());
        self.adapter.power_on().await
    }

    pub async fn register_agent(self: &mut Self, agent: &Agent) -> Result<(), Error> {
        if self.agent_registered {
            return Ok(());
        }
        self.adapter.register_agent(agent).await?;
        self.agent_registered = true;
        debug!("registered agent '{}' ({})", agent.path(), agent.capability());
        Ok(())
    }

    pub async fn unregister_agent(self: &mut Self, agent: &Agent) -> Result<(), Error> {
        if !self.agent_registered {
            return Ok(());
        }
        self.agent_registered = false;
        self.adapter.unregister_agent(agent).await
    }

    pub async fn register_application(self: &mut Self, application: &Application) -> Result<(), Error> {
        if self.application_registered {
            return Ok(());
        }
        self.adapter.register_application(application).await?;
        self.application_registered = true;
        debug!("registered application on '{}'", self.path());
        Ok(())
    }

    /// Safe to call when registration never completed.
    pub async fn unregister_application(self: &mut Self, application: &Application) -> Result<(), Error> {
        if !self.application_registered {
            return Ok(());
        }
        self.application_registered = false;
        self.adapter.unregister_application(application).await
    }

    pub async fn start_advertising(self: &mut Self, advertisement: &Advertisement) -> Result<(), Error> {
        if self.advertising {
            debug!("already advertising");
            return Ok(());
        }
        self.adapter.register_advertisement(advertisement).await?;
        self.advertising = true;
        info!("started advertising");
        Ok(())
    }

    pub async fn stop_advertising(self: &mut Self, advertisement: &Advertisement) -> Result<(), Error> {
        if !self.advertising {
            debug!("not advertising");
            return Ok(());
        }
        // Cleared only once the transport confirms the stop.
        self.adapter.unregister_advertisement(advertisement).await?;
        self.advertising = false;
        info!("stopped advertising");
        Ok(())
    }

    /// Advertises only while no central is connected. Intermediate states
    /// leave advertising untouched.
    pub async fn on_central_state_changed(
        self: &mut Self,
        device: &Device,
        advertisement: &Advertisement,
    ) -> Result<(), Error> {
        match device.connection_state {
            ConnectionState::Connected => self.stop_advertising(advertisement).await,
            ConnectionState::Disconnected => self.start_advertising(advertisement).await,
            ConnectionState::Connecting | ConnectionState::Disconnecting => Ok(()),
        }
    }

    pub async fn notify(self: &Self, notification: &Notification) -> Result<(), Error> {
        self.adapter.notify(notification).await
    }

    pub async fn release(self: Self) {
        debug!("releasing adapter '{}'", self.path());
        self.adapter.release().await;
    }
}
