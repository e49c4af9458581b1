//! Integration tests for the bus decoder.
//!
//! These feed byte streams through [`BusDecoder`] one byte at a time, the way a
//! serial reader would, and check the events and registry contents.

use homebus_protocol::{
    AcMode, AssemblerState, BinaryCategory, BusDecoder, BusEvent, DeviceAddress, DeviceReport,
    Diagnostic, FanSpeed, HeatingState, ProtocolError, SlotReport, SwitchState, MAX_FRAME_SIZE,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// Helpers
// ============================================================================

/// Build a 21-byte frame with a correct checksum.
fn build_frame(destination: u16, source: u16, command: u8, payload: [u8; 8]) -> Vec<u8> {
    let mut frame = vec![0xAA, 0x55, 0x00, 0x10, 0x00];
    frame.extend_from_slice(&destination.to_be_bytes());
    frame.extend_from_slice(&source.to_be_bytes());
    frame.push(command);
    frame.extend_from_slice(&payload);
    let checksum = frame[2..18].iter().fold(0u8, |sum, &b| sum.wrapping_add(b));
    frame.push(checksum);
    frame.extend_from_slice(&[0x0D, 0x0D]);
    frame
}

fn light_frame(room: u8, payload: [u8; 8]) -> Vec<u8> {
    build_frame(0x0100, 0x0E00 | u16::from(room), 0x01, payload)
}

fn feed_bytewise(decoder: &mut BusDecoder, bytes: &[u8]) -> Vec<BusEvent> {
    bytes.iter().filter_map(|&b| decoder.push_byte(b)).collect()
}

fn binary_slots(event: &BusEvent) -> Vec<SlotReport> {
    match event.report() {
        Some(DeviceReport::BinaryState(report)) => report.slots.clone(),
        other => panic!("Expected binary state report, got {:?}", other),
    }
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_end_to_end_light_frame() {
    let bytes = [
        0xAA, 0x55, 0x00, 0x10, 0x00, 0x01, 0x00, 0x0E, 0x05, 0x01, 0xFF, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x24, 0x0D, 0x0D,
    ];
    let mut decoder = BusDecoder::new();
    let events = feed_bytewise(&mut decoder, &bytes);

    assert_eq!(events.len(), 1);
    let BusEvent::Device { header, report } = &events[0] else {
        panic!("Expected device event, got {:?}", events[0]);
    };
    assert_eq!(header.destination, DeviceAddress::CONTROLLER);
    assert_eq!(header.source, DeviceAddress(0x0E05));
    assert_eq!(header.protocol, 1);
    assert_eq!(header.sequence, 0);

    let DeviceReport::BinaryState(report) = report else {
        panic!("Expected binary state report");
    };
    assert_eq!(report.category, BinaryCategory::Light);
    assert_eq!(report.room, 5);
    assert_eq!(
        report.slots,
        vec![SlotReport {
            slot: 0,
            state: SwitchState::On
        }]
    );

    let registry = decoder.registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.slots(BinaryCategory::Light, 5).iter().collect::<Vec<_>>(),
        vec![0]
    );
    assert_eq!(decoder.assembler_state(), AssemblerState::Idle);
}

#[test]
fn test_heating_frame() {
    let mut decoder = BusDecoder::new();
    let frame = build_frame(0x0100, 0x3602, 0x01, [0x12, 0x01, 22, 55, 20, 60, 0, 0]);
    let events = feed_bytewise(&mut decoder, &frame);

    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].report(),
        Some(&DeviceReport::Heating(HeatingState {
            room: 2,
            heating_on: true,
            hot_water_on: true,
            away_mode: true,
            target_temp: 22,
            hot_water_temp: 55,
            current_temp: 20,
            heating_water_temp: 60,
            boiler_error_code: 0,
        }))
    );
    assert!(decoder.registry().is_empty());
}

#[test]
fn test_air_conditioner_frame_from_controller() {
    let mut decoder = BusDecoder::new();
    let frame = build_frame(0x3903, 0x0100, 0x01, [0x10, 0x00, 0x02, 0x00, 26, 23, 0, 0]);
    let events = feed_bytewise(&mut decoder, &frame);

    let Some(DeviceReport::AirConditioner(state)) = events[0].report() else {
        panic!("Expected AC report, got {:?}", events);
    };
    assert_eq!(state.room, 3);
    assert!(state.power_on);
    assert_eq!(state.mode, AcMode::Cooling);
    assert_eq!(state.fan_speed, FanSpeed::Medium);
    assert_eq!(state.current_temp, 26);
    assert_eq!(state.target_temp, 23);
}

#[test]
fn test_unattributable_frames() {
    let mut decoder = BusDecoder::new();
    let no_controller = build_frame(0x0E05, 0x3B02, 0x01, [0; 8]);
    let unknown_family = build_frame(0x0100, 0x4403, 0x01, [0; 8]);

    let mut stream = no_controller.clone();
    stream.extend_from_slice(&unknown_family);
    let events = feed_bytewise(&mut decoder, &stream);

    assert_eq!(
        events,
        vec![
            BusEvent::Diagnostic(Diagnostic::UnknownAddressing {
                destination: DeviceAddress(0x0E05),
                source: DeviceAddress(0x3B02),
                raw: no_controller,
            }),
            BusEvent::Diagnostic(Diagnostic::UnknownDeviceFamily {
                family: 0x44,
                room: 3
            }),
        ]
    );
    assert!(decoder.registry().is_empty());
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discovery_is_idempotent() {
    let frame = light_frame(5, [0xFF, 0x00, 0xFF, 0, 0, 0, 0, 0]);

    let mut once = BusDecoder::new();
    let first = feed_bytewise(&mut once, &frame);

    let mut twice = BusDecoder::new();
    feed_bytewise(&mut twice, &frame);
    let second = feed_bytewise(&mut twice, &frame);

    assert_eq!(once.registry(), twice.registry());
    assert_eq!(binary_slots(&first[0]), binary_slots(&second[0]));
    assert_eq!(binary_slots(&second[0]).len(), 2);

    let Some(DeviceReport::BinaryState(report)) = second[0].report() else {
        unreachable!()
    };
    assert!(report.newly_discovered.is_empty());
}

#[test]
fn test_all_on_frame_is_skipped() {
    let mut decoder = BusDecoder::new();
    feed_bytewise(&mut decoder, &light_frame(5, [0xFF, 0, 0, 0, 0, 0, 0, 0]));
    let before = decoder.registry().clone();

    let events = feed_bytewise(&mut decoder, &light_frame(5, [0xFF; 8]));

    assert_eq!(events.len(), 1);
    let Some(DeviceReport::BinaryState(report)) = events[0].report() else {
        panic!("Expected binary state report");
    };
    assert!(report.discovery_skipped);
    assert!(report.slots.is_empty());
    assert_eq!(decoder.registry(), &before);
}

#[test]
fn test_all_on_room_is_never_discovered() {
    let mut decoder = BusDecoder::new();
    for _ in 0..3 {
        feed_bytewise(&mut decoder, &light_frame(9, [0xFF; 8]));
    }
    assert!(decoder.registry().is_empty());
}

#[test]
fn test_known_slots_reported_after_turning_off() {
    let mut decoder = BusDecoder::new();
    feed_bytewise(&mut decoder, &light_frame(5, [0xFF, 0, 0xFF, 0, 0, 0, 0, 0]));
    let events = feed_bytewise(&mut decoder, &light_frame(5, [0, 0, 0xFF, 0, 0, 0, 0, 0]));

    assert_eq!(
        binary_slots(&events[0]),
        vec![
            SlotReport {
                slot: 0,
                state: SwitchState::Off
            },
            SlotReport {
                slot: 2,
                state: SwitchState::On
            },
        ]
    );
}

#[test]
fn test_lights_and_outlets_tracked_separately() {
    let mut decoder = BusDecoder::new();
    feed_bytewise(&mut decoder, &light_frame(2, [0, 0xFF, 0, 0, 0, 0, 0, 0]));
    feed_bytewise(
        &mut decoder,
        &build_frame(0x0100, 0x3B02, 0x01, [0, 0, 0, 0xFF, 0, 0, 0, 0]),
    );

    let registry = decoder.registry();
    assert!(registry.contains(BinaryCategory::Light, 2, 1));
    assert!(!registry.contains(BinaryCategory::Light, 2, 3));
    assert!(registry.contains(BinaryCategory::Outlet, 2, 3));
    assert!(!registry.contains(BinaryCategory::Outlet, 2, 1));
}

// ============================================================================
// Integrity and framing
// ============================================================================

#[test]
fn test_every_single_bit_flip_is_rejected() {
    let frame = light_frame(5, [0xFF, 0, 0, 0, 0, 0, 0, 0]);

    for offset in 2..=17 {
        for bit in 0..8 {
            let mut corrupted = frame.clone();
            corrupted[offset] ^= 1 << bit;

            let mut decoder = BusDecoder::new();
            let events = feed_bytewise(&mut decoder, &corrupted);

            assert_eq!(events.len(), 1, "offset {} bit {}", offset, bit);
            let Some(Diagnostic::Rejected { error, .. }) = events[0].diagnostic() else {
                panic!("offset {} bit {}: expected rejection, got {:?}", offset, bit, events[0]);
            };
            assert!(
                matches!(error, ProtocolError::ChecksumMismatch { .. }),
                "offset {} bit {}: {:?}",
                offset,
                bit,
                error
            );
            assert!(decoder.registry().is_empty());
        }
    }
}

#[test]
fn test_resync_after_noise() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let frame = light_frame(4, [0, 0, 0, 0, 0, 0, 0, 0xFF]);

    for noise_len in [0, 1, 2, 17, 255, 256, 1000] {
        let mut stream: Vec<u8> = (0..noise_len)
            .map(|_| loop {
                let b: u8 = rng.gen();
                if b != 0xAA {
                    break b;
                }
            })
            .collect();
        stream.extend_from_slice(&frame);

        let mut decoder = BusDecoder::new();
        let events = feed_bytewise(&mut decoder, &stream);

        assert_eq!(events.len(), 1, "noise_len {}", noise_len);
        assert_eq!(
            binary_slots(&events[0]),
            vec![SlotReport {
                slot: 7,
                state: SwitchState::On
            }]
        );
    }
}

#[test]
fn test_resync_after_stray_first_markers() {
    let frame = light_frame(4, [0, 0, 0, 0, 0, 0, 0, 0xFF]);

    // Fixed cases: a lone AA, AA AA, and AA followed by a terminator byte.
    let mut stream = vec![0xAA, 0x00, 0xAA, 0xAA, 0x12, 0xAA, 0x0D, 0x0D, 0x01];
    stream.extend_from_slice(&frame);
    let mut decoder = BusDecoder::new();
    let events = feed_bytewise(&mut decoder, &stream);
    assert_eq!(events.len(), 1);
    assert!(events[0].report().is_some());

    // Random noise rich in 0xAA. Only `AA 55` and a trailing `AA` are excluded:
    // the first would start a frame, the second swallows the real marker.
    let mut rng = ChaCha8Rng::seed_from_u64(0xAA55);
    let mut stray_markers = 0;
    for noise_len in [2, 3, 16, 64, 300, 1000] {
        let mut noise: Vec<u8> = (0..noise_len)
            .map(|_| if rng.gen_bool(0.3) { 0xAA } else { rng.gen() })
            .collect();
        for i in 0..noise.len() {
            let next = noise.get(i + 1).copied();
            if noise[i] == 0xAA && (next.is_none() || next == Some(0x55)) {
                noise[i] = 0x00;
            }
        }
        stray_markers += noise.iter().filter(|&&b| b == 0xAA).count();

        let mut stream = noise;
        stream.extend_from_slice(&frame);
        let mut decoder = BusDecoder::new();
        let events = feed_bytewise(&mut decoder, &stream);

        assert_eq!(events.len(), 1, "noise_len {}", noise_len);
        assert_eq!(
            binary_slots(&events[0]),
            vec![SlotReport {
                slot: 7,
                state: SwitchState::On
            }]
        );
    }
    assert!(stray_markers > 100);
}

#[test]
fn test_trailing_first_marker_swallows_frame_start() {
    let frame = light_frame(4, [0, 0, 0, 0, 0, 0, 0, 0xFF]);
    let mut stream = vec![0xAA];
    stream.extend_from_slice(&frame);

    let mut decoder = BusDecoder::new();
    assert!(feed_bytewise(&mut decoder, &stream).is_empty());
    assert!(decoder.registry().is_empty());
    assert_eq!(decoder.assembler_state(), AssemblerState::Idle);
}

#[test]
fn test_resync_after_partial_frame() {
    let mut decoder = BusDecoder::new();
    let frame = light_frame(1, [0xFF, 0, 0, 0, 0, 0, 0, 0]);

    // A truncated frame followed by a full one: the remains of the first are
    // swallowed, and the stream recovers by the next frame.
    let mut stream = frame[..12].to_vec();
    stream.extend_from_slice(&frame);
    stream.extend_from_slice(&frame);
    let events = feed_bytewise(&mut decoder, &stream);

    assert!(events.iter().any(|e| e.report().is_some()));
    assert!(decoder.registry().contains(BinaryCategory::Light, 1, 0));
    assert_eq!(decoder.assembler_state(), AssemblerState::Idle);
}

#[test]
fn test_terminator_inside_payload_truncates() {
    let mut decoder = BusDecoder::new();
    let frame = light_frame(1, [0xFF, 0x0D, 0x0D, 0, 0, 0, 0, 0]);
    let events = feed_bytewise(&mut decoder, &frame);

    assert_eq!(
        events.first().and_then(BusEvent::diagnostic).map(Diagnostic::kind),
        Some("frame_too_short")
    );
    assert!(decoder.registry().is_empty());
}

#[test]
fn test_overflow_then_recover() {
    let mut decoder = BusDecoder::new();
    let mut stream = vec![0xAA, 0x55];
    stream.extend(std::iter::repeat(0x42).take(MAX_FRAME_SIZE));
    stream.extend_from_slice(&light_frame(6, [0xFF, 0, 0, 0, 0, 0, 0, 0]));

    let events = feed_bytewise(&mut decoder, &stream);
    assert_eq!(
        events[0],
        BusEvent::Diagnostic(Diagnostic::BufferOverflow {
            len: MAX_FRAME_SIZE
        })
    );
    assert_eq!(events.len(), 2);
    assert!(decoder.registry().contains(BinaryCategory::Light, 6, 0));
}

// ============================================================================
// Totality
// ============================================================================

/// Random streams biased towards the framing bytes so that every state and
/// transition gets exercised.
fn random_stream(rng: &mut ChaCha8Rng, len: usize) -> Vec<u8> {
    const INTERESTING: [u8; 5] = [0xAA, 0x55, 0x0D, 0xFF, 0x00];
    (0..len)
        .map(|_| {
            if rng.gen_bool(0.4) {
                INTERESTING[rng.gen_range(0..INTERESTING.len())]
            } else {
                rng.gen()
            }
        })
        .collect()
}

#[test]
fn test_arbitrary_input_never_sticks() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..200 {
        let len = rng.gen_range(0..4096);
        let stream = random_stream(&mut rng, len);
        let mut decoder = BusDecoder::new();
        let mut accumulating_run = 0usize;

        for &byte in &stream {
            let _ = decoder.push_byte(byte);
            if decoder.assembler_state() == AssemblerState::Accumulating {
                accumulating_run += 1;
                assert!(accumulating_run < MAX_FRAME_SIZE);
            } else {
                accumulating_run = 0;
            }
        }

        for entry in decoder.registry().iter() {
            assert!(entry.slots.iter().all(|slot| slot < 8));
        }
    }
}

#[test]
fn test_random_valid_frames_round_trip_through_noise() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut decoder = BusDecoder::new();
    let mut decoded = 0;
    let mut sent = 0;

    for _ in 0..500 {
        let room: u8 = rng.gen();
        let mut payload = [0u8; 8];
        for byte in payload.iter_mut() {
            *byte = if rng.gen_bool(0.3) { 0xFF } else { rng.gen_range(0..0x0D) };
        }
        let frame = light_frame(room, payload);
        if frame[18] == 0x0D {
            continue;
        }

        let noise: Vec<u8> = (0..rng.gen_range(0..8))
            .map(|_| rng.gen_range(0x00..0xAA))
            .collect();
        feed_bytewise(&mut decoder, &noise);

        sent += 1;
        let events = feed_bytewise(&mut decoder, &frame);
        if events.iter().any(|e| e.report().is_some()) {
            decoded += 1;
        }
    }

    assert_eq!(decoded, sent);
}
