//! Integration tests for cross-context command routing.

use fakelens_bus::{
    BackgroundRelay, Command, ContextId, DownloadData, MemoryDownloadSink, MessageBus, TabHandle,
};

#[test]
fn message_bus_ordering_tests_relay_injects_then_delivers_start() {
    let mut bus = MessageBus::new();
    let mut sink = MemoryDownloadSink::new();
    let relay = BackgroundRelay::new();

    bus.attach(ContextId::Background);
    let tab = TabHandle(3);
    bus.send(ContextId::Background, Command::StartRecording { tab_id: tab });

    let command = bus.recv(ContextId::Background).expect("queued command");
    relay.handle(command, &mut bus, &mut sink).expect("relay");

    assert!(bus.is_attached(ContextId::Content(tab)));
    assert_eq!(
        bus.recv(ContextId::Content(tab)),
        Some(Command::StartRecording { tab_id: tab })
    );
}

#[test]
fn message_bus_ordering_tests_stop_to_vanished_tab_is_silent() {
    let mut bus = MessageBus::new();
    let mut sink = MemoryDownloadSink::new();
    let relay = BackgroundRelay::new();

    let result = relay.handle(
        Command::StopRecording {
            tab_id: TabHandle(9),
        },
        &mut bus,
        &mut sink,
    );

    assert!(result.is_ok());
    assert_eq!(bus.dropped_count(), 1);
}

#[test]
fn message_bus_ordering_tests_download_reaches_the_sink_once() {
    let mut bus = MessageBus::new();
    let mut sink = MemoryDownloadSink::new();
    let relay = BackgroundRelay::new();

    relay
        .handle(
            Command::Download {
                data: DownloadData {
                    url: "data:video/webm;base64,AAAA".to_string(),
                    filename: "screen_recording_2026-08-27.webm".to_string(),
                },
            },
            &mut bus,
            &mut sink,
        )
        .expect("relay");

    assert_eq!(sink.saved().len(), 1);
    assert_eq!(sink.saved()[0].0, "screen_recording_2026-08-27.webm");
}

#[test]
fn message_bus_ordering_tests_per_channel_fifo_survives_interleaving() {
    let mut bus = MessageBus::new();
    let tab_a = TabHandle(1);
    let tab_b = TabHandle(2);
    bus.attach(ContextId::Content(tab_a));
    bus.attach(ContextId::Content(tab_b));

    bus.send(ContextId::Content(tab_a), Command::StartRecording { tab_id: tab_a });
    bus.send(ContextId::Content(tab_b), Command::StartRecording { tab_id: tab_b });
    bus.send(ContextId::Content(tab_a), Command::StopRecording { tab_id: tab_a });

    assert_eq!(
        bus.recv(ContextId::Content(tab_a)),
        Some(Command::StartRecording { tab_id: tab_a })
    );
    assert_eq!(
        bus.recv(ContextId::Content(tab_a)),
        Some(Command::StopRecording { tab_id: tab_a })
    );
    assert_eq!(
        bus.recv(ContextId::Content(tab_b)),
        Some(Command::StartRecording { tab_id: tab_b })
    );
}

#[test]
fn message_bus_ordering_tests_wire_schema_round_trips() {
    let command = Command::Download {
        data: DownloadData {
            url: "data:video/webm;base64,AAAA".to_string(),
            filename: "screen_recording_2026-08-27.webm".to_string(),
        },
    };

    let raw = command.to_json_bytes().expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&raw).expect("json");
    assert_eq!(value["action"], "download");
    assert_eq!(value["data"]["filename"], "screen_recording_2026-08-27.webm");

    let decoded = Command::from_json_bytes(&raw).expect("decode");
    assert_eq!(decoded, command);
}
