mod common;

use common::{central, DeferredPairing, MockTransport};
use futures::{
    channel::oneshot,
    future::{self, FutureExt},
};
use htsd::{
    config::Config,
    device::ConnectionState,
    gatt::{AttError, Attribute, ReadRequest, WriteRequest},
    peripheral::Event,
    thermometer::{
        HealthThermometer, CUD_DESCRIPTOR_UUID, CUD_VALUE, HTS_SERVICE_UUID,
        TEMPERATURE_CHAR_UUID, TEMPERATURE_NOTIFY_VALUE, TEMPERATURE_READ_VALUE,
    },
    Coordinator, State, Trigger,
};
use std::time::Duration;

fn coordinator(transport: MockTransport) -> Coordinator<MockTransport> {
    Coordinator::new(
        transport,
        Config::default(),
        HealthThermometer,
        DeferredPairing::new(),
    )
}

fn coordinator_with_timeout(transport: MockTransport, seconds: u64) -> Coordinator<MockTransport> {
    let config = Config {
        timeout: Duration::from_secs(seconds),
        ..Config::default()
    };
    Coordinator::new(transport, config, HealthThermometer, DeferredPairing::new())
}

fn temperature() -> Attribute {
    Attribute::characteristic(HTS_SERVICE_UUID, TEMPERATURE_CHAR_UUID)
}

fn read_request(attribute: Attribute) -> ReadRequest {
    ReadRequest {
        attribute,
        device: None,
        mtu: 23,
        offset: 0,
    }
}

#[tokio::test]
async fn starts_advertising_after_setup() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);

    coordinator.start().await;

    assert_eq!(coordinator.state(), State::Advertising);
    let controller = coordinator.adapter().unwrap();
    assert!(controller.is_agent_registered());
    assert!(controller.is_application_registered());
    assert!(controller.is_advertising());
    assert_eq!(
        coordinator.advertisement().unwrap().local_name(),
        Some("BINC")
    );
    let journal = journal.lock().unwrap();
    assert_eq!(
        journal.calls,
        vec![
            "default_adapter",
            "power_on",
            "register_agent",
            "register_application",
            "register_advertisement",
        ]
    );
    assert!(journal.advertising);
}

#[tokio::test]
async fn skips_power_on_when_already_powered() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport.powered());

    coordinator.start().await;

    assert_eq!(journal.lock().unwrap().count("power_on"), 0);
    assert_eq!(coordinator.state(), State::Advertising);
}

#[tokio::test]
async fn advertises_only_while_no_central_is_connected() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;

    coordinator
        .dispatch(Event::CentralStateChanged(central(ConnectionState::Connected)))
        .await;
    assert!(!journal.lock().unwrap().advertising);
    assert_eq!(coordinator.state(), State::Connected);

    coordinator
        .dispatch(Event::CentralStateChanged(central(ConnectionState::Disconnecting)))
        .await;
    assert!(!journal.lock().unwrap().advertising);

    coordinator
        .dispatch(Event::CentralStateChanged(central(ConnectionState::Disconnected)))
        .await;
    assert!(journal.lock().unwrap().advertising);
    assert_eq!(coordinator.state(), State::Advertising);

    coordinator
        .dispatch(Event::CentralStateChanged(central(ConnectionState::Disconnected)))
        .await;
    let journal = journal.lock().unwrap();
    assert_eq!(journal.count("register_advertisement"), 2);
    assert_eq!(journal.count("unregister_advertisement"), 1);
}

#[tokio::test]
async fn shutdown_releases_in_order_once() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;

    coordinator.shutdown().await;
    coordinator.shutdown().await;

    assert_eq!(coordinator.state(), State::Stopped);
    let journal = journal.lock().unwrap();
    assert_eq!(
        journal.since("unregister_agent"),
        vec![
            "unregister_agent",
            "unregister_application",
            "unregister_advertisement",
            "release",
            "close",
        ]
    );
    assert!(!journal.advertising);
}

#[tokio::test]
async fn shutdown_while_connected_skips_stopped_advertisement() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;
    coordinator
        .dispatch(Event::CentralStateChanged(central(ConnectionState::Connected)))
        .await;

    coordinator.shutdown().await;

    assert_eq!(journal.lock().unwrap().count("unregister_advertisement"), 1);
}

#[tokio::test]
async fn shutdown_before_start_only_closes_transport() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);

    coordinator.shutdown().await;

    assert_eq!(journal.lock().unwrap().calls, vec!["close"]);
    assert_eq!(coordinator.state(), State::Stopped);
}

#[tokio::test]
async fn failed_registration_degrades_and_is_not_undone() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport.failing("register_application"));

    coordinator.start().await;
    assert_eq!(coordinator.state(), State::Degraded);
    assert!(journal.lock().unwrap().advertising);

    coordinator.shutdown().await;
    let journal = journal.lock().unwrap();
    assert_eq!(journal.count("unregister_application"), 0);
    assert_eq!(journal.count("release"), 1);
}

#[tokio::test(start_paused = true)]
async fn without_adapter_runs_until_timeout() {
    let (transport, journal) = MockTransport::without_adapter();
    let mut coordinator = coordinator(transport);

    let trigger = coordinator.run(future::pending::<()>()).await;

    assert_eq!(trigger, Trigger::Timeout);
    assert_eq!(coordinator.state(), State::Stopped);
    assert_eq!(journal.lock().unwrap().calls, vec!["default_adapter", "close"]);
}

#[tokio::test(start_paused = true)]
async fn timeout_triggers_shutdown() {
    let (transport, journal) = MockTransport::new();
    let config = Config {
        timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let mut coordinator = Coordinator::new(
        transport,
        config,
        HealthThermometer,
        DeferredPairing::new(),
    );

    let started = tokio::time::Instant::now();
    let trigger = coordinator.run(future::pending::<()>()).await;

    assert_eq!(trigger, Trigger::Timeout);
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(journal.lock().unwrap().count("release"), 1);
}

#[tokio::test(start_paused = true)]
async fn interrupt_triggers_shutdown() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);

    let trigger = coordinator
        .run(tokio::time::sleep(Duration::from_secs(1)))
        .await;

    assert_eq!(trigger, Trigger::Interrupt);
    assert_eq!(coordinator.state(), State::Stopped);
    let journal = journal.lock().unwrap();
    assert_eq!(journal.count("unregister_agent"), 1);
    assert_eq!(journal.count("close"), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_cuts_adapter_lookup_short() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator_with_timeout(transport.hanging("default_adapter"), 5);

    let started = tokio::time::Instant::now();
    let trigger = coordinator.run(future::pending::<()>()).await;

    assert_eq!(trigger, Trigger::Timeout);
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(6));
    assert_eq!(coordinator.state(), State::Stopped);
    assert_eq!(journal.lock().unwrap().calls, vec!["default_adapter", "close"]);
}

#[tokio::test(start_paused = true)]
async fn interrupt_cuts_adapter_lookup_short() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport.hanging("default_adapter"));

    let trigger = coordinator
        .run(tokio::time::sleep(Duration::from_secs(1)))
        .await;

    assert_eq!(trigger, Trigger::Interrupt);
    assert_eq!(coordinator.state(), State::Stopped);
    assert_eq!(journal.lock().unwrap().calls, vec!["default_adapter", "close"]);
}

#[tokio::test(start_paused = true)]
async fn interrupted_setup_releases_what_it_acquired() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator_with_timeout(transport.hanging("register_application"), 5);

    let trigger = coordinator.run(future::pending::<()>()).await;

    assert_eq!(trigger, Trigger::Timeout);
    assert_eq!(coordinator.state(), State::Stopped);
    assert_eq!(
        journal.lock().unwrap().calls,
        vec![
            "default_adapter",
            "power_on",
            "register_agent",
            "register_application",
            "unregister_agent",
            "release",
            "close",
        ]
    );
}

#[tokio::test]
async fn failed_stop_keeps_advertisement_registered() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport.failing("unregister_advertisement"));
    coordinator.start().await;

    coordinator
        .dispatch(Event::CentralStateChanged(central(ConnectionState::Connected)))
        .await;
    assert!(coordinator.adapter().unwrap().is_advertising());

    coordinator
        .dispatch(Event::CentralStateChanged(central(ConnectionState::Disconnected)))
        .await;
    assert!(coordinator.adapter().unwrap().is_advertising());

    coordinator.shutdown().await;
    let journal = journal.lock().unwrap();
    assert_eq!(journal.count("register_advertisement"), 1);
    assert_eq!(journal.count("unregister_advertisement"), 2);
    assert!(journal.advertising);
}

#[tokio::test]
async fn read_returns_measurement() {
    let (transport, _journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;

    let (response, receiver) = oneshot::channel();
    coordinator
        .dispatch(Event::Read {
            request: read_request(temperature()),
            response,
        })
        .await;

    assert_eq!(receiver.await.unwrap(), Ok(TEMPERATURE_READ_VALUE.to_vec()));
}

#[tokio::test]
async fn read_of_user_description() {
    let (transport, _journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;

    let (response, receiver) = oneshot::channel();
    let attribute =
        Attribute::descriptor(HTS_SERVICE_UUID, TEMPERATURE_CHAR_UUID, CUD_DESCRIPTOR_UUID);
    coordinator
        .dispatch(Event::Read {
            request: read_request(attribute),
            response,
        })
        .await;

    assert_eq!(receiver.await.unwrap(), Ok(CUD_VALUE.to_vec()));
}

#[tokio::test]
async fn write_is_committed() {
    let (transport, _journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;

    let (response, receiver) = oneshot::channel();
    coordinator
        .dispatch(Event::Write {
            request: WriteRequest {
                attribute: temperature(),
                device: Some(common::DEVICE_ADDRESS.to_owned()),
                value: vec![0x01, 0x02],
                mtu: 23,
                offset: 0,
            },
            response,
        })
        .await;

    assert_eq!(receiver.await.unwrap(), Ok(Vec::new()));
    let application = coordinator.application().unwrap();
    assert_eq!(
        application.characteristic_value(HTS_SERVICE_UUID, TEMPERATURE_CHAR_UUID),
        Some(&[0x01, 0x02][..])
    );
}

#[tokio::test]
async fn subscription_pushes_one_measurement() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;

    coordinator
        .dispatch(Event::NotifySubscribe(temperature()))
        .await;

    let journal = journal.lock().unwrap();
    assert_eq!(journal.notifications.len(), 1);
    assert_eq!(journal.notifications[0].characteristic, TEMPERATURE_CHAR_UUID);
    assert_eq!(journal.notifications[0].value, TEMPERATURE_NOTIFY_VALUE.to_vec());
}

#[tokio::test]
async fn unsubscribe_without_subscription_is_ignored() {
    let (transport, journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;

    coordinator
        .dispatch(Event::NotifyUnsubscribe(temperature()))
        .await;

    let application = coordinator.application().unwrap();
    assert!(!application.is_notifying(HTS_SERVICE_UUID, TEMPERATURE_CHAR_UUID));
    assert!(journal.lock().unwrap().notifications.is_empty());
}

#[tokio::test]
async fn requests_fail_without_adapter() {
    let (transport, _journal) = MockTransport::without_adapter();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;
    assert_eq!(coordinator.state(), State::Degraded);

    let (response, receiver) = oneshot::channel();
    coordinator
        .dispatch(Event::Read {
            request: read_request(temperature()),
            response,
        })
        .await;

    assert_eq!(receiver.await.unwrap(), Err(AttError::Failed));
}

#[tokio::test]
async fn authorization_is_granted() {
    let (transport, _journal) = MockTransport::new();
    let mut coordinator = coordinator(transport);
    coordinator.start().await;

    let (response, receiver) = oneshot::channel();
    coordinator
        .dispatch(Event::AuthorizationRequest {
            device: central(ConnectionState::Connected),
            response,
        })
        .await;

    assert_eq!(receiver.await, Ok(true));
}

#[tokio::test]
async fn passkey_prompt_does_not_block_events() {
    let (transport, _journal) = MockTransport::new();
    let pairing = DeferredPairing::new();
    let pending = pairing.pending.clone();
    let mut coordinator =
        Coordinator::new(transport, Config::default(), HealthThermometer, pairing);
    let events = coordinator.event_sender();

    let (reply, passkey) = htsd::agent::PasskeyReply::channel();
    events
        .unbounded_send(Event::PasskeyRequest {
            device: central(ConnectionState::Connected),
            reply,
        })
        .unwrap();
    let (response, read) = oneshot::channel();
    events
        .unbounded_send(Event::Read {
            request: read_request(temperature()),
            response,
        })
        .unwrap();

    // The loop only stops once the read behind the pending prompt is answered.
    let trigger = coordinator.run(read.map(|_| ())).await;
    assert_eq!(trigger, Trigger::Interrupt);

    // Shutdown abandons the prompt, which cancels the request.
    assert!(pending.lock().unwrap().is_empty());
    assert!(passkey.await.is_err());
}

#[tokio::test]
async fn passkey_is_delivered_when_answered() {
    let (transport, _journal) = MockTransport::new();
    let pairing = DeferredPairing::new();
    let pending = pairing.pending.clone();
    let mut coordinator =
        Coordinator::new(transport, Config::default(), HealthThermometer, pairing);
    coordinator.start().await;

    let (reply, passkey) = htsd::agent::PasskeyReply::channel();
    coordinator
        .dispatch(Event::PasskeyRequest {
            device: central(ConnectionState::Connected),
            reply,
        })
        .await;

    let reply = pending.lock().unwrap().pop().unwrap();
    assert!(reply.send(123_456));
    assert_eq!(passkey.await, Ok(123_456));
}
