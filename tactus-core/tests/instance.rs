use tactus_core::{ArpeggiatorInstance, Config, EngineFeedback, InstanceHandles};
use tactus_types::{ChordShape, MidiKind, MidiMessage, TimedEvent, TransportUpdate};

const RATE: f64 = 48_000.0;
const BEAT: u64 = 24_000;
const BLOCK: u32 = 480;
const CAPACITY: u32 = 8192;

fn instance(toml: &str) -> (ArpeggiatorInstance, InstanceHandles) {
    let config = Config::parse(toml).unwrap();
    let (mut instance, handles) = ArpeggiatorInstance::instantiate(RATE, &config).unwrap();
    instance.activate();
    (instance, handles)
}

fn transport(update: TransportUpdate) -> TimedEvent {
    TimedEvent::transport(0, update)
}

fn play() -> TimedEvent {
    transport(TransportUpdate {
        speed: Some(1.0),
        ..TransportUpdate::default()
    })
}

fn stop() -> TimedEvent {
    transport(TransportUpdate {
        speed: Some(0.0),
        ..TransportUpdate::default()
    })
}

fn bar_start() -> TimedEvent {
    transport(TransportUpdate {
        bar_beat: Some(0.0),
        ..TransportUpdate::default()
    })
}

fn hold(note: u8) -> TimedEvent {
    TimedEvent::midi(0, MidiMessage::note_on(0, note, 100))
}

/// Run `blocks` blocks, feeding `input` to the first, and return the MIDI
/// output stamped with frames relative to the first block.
fn collect(
    instance: &mut ArpeggiatorInstance,
    input: &[TimedEvent],
    blocks: u64,
) -> Vec<(u64, MidiKind)> {
    let mut log = Vec::new();
    for block in 0..blocks {
        let input = if block == 0 { input } else { &[] };
        for event in instance.run(input, BLOCK, CAPACITY) {
            if let Some(msg) = event.as_midi() {
                log.push((block * BLOCK as u64 + event.frame as u64, msg.kind()));
            }
        }
    }
    log
}

fn blocks_for(frames: u64) -> u64 {
    frames / BLOCK as u64
}

#[test]
fn test_plays_configured_defaults() {
    let (mut instance, _handles) = instance("[defaults]\nrange = 2\n[runtime]\nvelocity = 90");
    let log = collect(&mut instance, &[play(), hold(60)], blocks_for(2 * BEAT));
    assert_eq!(
        log,
        vec![
            (0, MidiKind::NoteOn { note: 60, velocity: 90 }),
            (BEAT / 2, MidiKind::NoteOff { note: 60 }),
            (BEAT, MidiKind::NoteOn { note: 72, velocity: 90 }),
            (BEAT + BEAT / 2, MidiKind::NoteOff { note: 72 }),
        ]
    );
}

#[test]
fn test_feedback_reports_lifecycle() {
    let (mut instance, handles) = instance("[defaults]\nrange = 2");
    instance.run(&[play(), hold(60)], BLOCK, CAPACITY);

    let feedback = handles.feedback.drain();
    let committed = feedback.iter().find_map(|msg| match msg {
        EngineFeedback::ConfigCommitted(config) => Some(*config),
        _ => None,
    });
    assert_eq!(committed.map(|c| c.range), Some(2));
    assert!(feedback.contains(&EngineFeedback::PlayingChanged(true)));

    instance.run(&[stop()], BLOCK, CAPACITY);
    assert_eq!(
        handles.feedback.drain(),
        vec![EngineFeedback::PlayingChanged(false)]
    );
}

#[test]
fn test_published_controls_wait_for_bar() {
    let (mut instance, mut handles) = instance("");
    collect(&mut instance, &[play(), hold(60)], blocks_for(BEAT));
    handles.feedback.drain();

    handles.controls.update(|c| c.chord = 1.0);
    collect(&mut instance, &[], blocks_for(2 * BEAT));
    assert_eq!(instance.arpeggiator().config().chord, Some(ChordShape::Octave));
    assert!(handles.feedback.drain().is_empty());

    instance.run(&[bar_start()], BLOCK, CAPACITY);
    assert_eq!(instance.arpeggiator().config().chord, Some(ChordShape::Major));
    assert!(matches!(
        handles.feedback.drain().as_slice(),
        [EngineFeedback::ConfigCommitted(config)] if config.chord == Some(ChordShape::Major)
    ));
}

#[test]
fn test_telemetry_window() {
    let (mut instance, handles) = instance("[runtime]\ntelemetry_window = 4");
    for _ in 0..8 {
        instance.run(&[], BLOCK, CAPACITY);
    }
    let summaries: Vec<u64> = handles
        .feedback
        .drain()
        .into_iter()
        .filter_map(|msg| match msg {
            EngineFeedback::TelemetrySummary { blocks, .. } => Some(blocks),
            _ => None,
        })
        .collect();
    assert_eq!(summaries, vec![4, 8]);
    assert_eq!(handles.feedback.drain_and_log(), 0);
}

#[test]
fn test_dropped_events_are_reported() {
    let (mut instance, handles) = instance("");
    let out = instance.run(&[play(), hold(60)], BLOCK, 0);
    assert!(out.is_empty());
    assert_eq!(out.dropped(), 1);
    assert!(handles
        .feedback
        .drain()
        .contains(&EngineFeedback::EventsDropped(1)));
}

#[test]
fn test_fixed_seed_repeats_across_activations() {
    let toml = "[defaults]\nrange = 3\nskip = 50.0\n[runtime]\nseed = 99";
    let blocks = blocks_for(64 * BEAT);

    let (mut a, _ha) = instance(toml);
    let first = collect(&mut a, &[play(), hold(60)], blocks);
    a.deactivate();
    a.activate();
    let second = collect(&mut a, &[play(), hold(60)], blocks);
    assert_eq!(first, second);

    let (mut b, _hb) = instance(toml);
    assert_eq!(first, collect(&mut b, &[play(), hold(60)], blocks));

    let played = first
        .iter()
        .filter(|(_, kind)| matches!(kind, MidiKind::NoteOn { .. }))
        .count();
    assert!(played > 0 && played < 64);
}

#[test]
fn test_deactivated_instance_is_silent() {
    let (mut instance, _handles) = instance("");
    collect(&mut instance, &[play(), hold(60)], 4);
    instance.deactivate();
    assert!(!instance.is_active());
    assert!(collect(&mut instance, &[play(), hold(60)], blocks_for(2 * BEAT)).is_empty());
}
