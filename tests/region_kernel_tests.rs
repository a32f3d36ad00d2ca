use cachalot::audio::AssetHandle;
use cachalot::kernel::event::{ExtractionTicket, PlaybackEvent, RegionEvent};
use cachalot::kernel::region::{ColorToken, RegionId, MIN_REGION_SECONDS, REGION_PALETTE};
use cachalot::kernel::scheduler::{ExtractionRequest, SideEffect};
use cachalot::kernel::state::{ExtractionStatus, Phase};
use cachalot::{ExtractionError, RegionReactor, ValidationError};

fn loaded(duration: f64) -> RegionReactor {
    let mut reactor = RegionReactor::default();
    reactor
        .step(RegionEvent::SourceLoaded {
            duration_seconds: duration,
        })
        .unwrap();
    reactor
}

fn create(reactor: &mut RegionReactor, id: &str, start: f64, end: f64) -> Vec<SideEffect> {
    reactor
        .step(RegionEvent::Created {
            id: RegionId::new(id),
            start_seconds: start,
            end_seconds: end,
        })
        .unwrap()
}

fn started(effects: &[SideEffect]) -> Option<&ExtractionRequest> {
    effects.iter().find_map(|e| match e {
        SideEffect::StartExtraction(req) => Some(req),
        _ => None,
    })
}

fn starts(effects: &[SideEffect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, SideEffect::StartExtraction(_)))
        .count()
}

fn finish(reactor: &mut RegionReactor, ticket: ExtractionTicket, raw: u64) -> Vec<SideEffect> {
    reactor
        .step(RegionEvent::ExtractionFinished {
            ticket,
            outcome: Ok(AssetHandle::from_raw(raw)),
        })
        .unwrap()
}

#[test]
fn test_create_enforces_min_duration_and_starts_extraction() {
    let mut reactor = loaded(20.0);
    let effects = create(&mut reactor, "a", 2.0, 2.03);

    let req = started(&effects).expect("extraction started");
    assert!((req.start_seconds - 1.9825).abs() < 1e-9);
    assert!((req.end_seconds - req.start_seconds - MIN_REGION_SECONDS).abs() < 1e-9);
    assert_eq!(req.ticket.region_id, RegionId::new("a"));

    let snap = reactor.state.snapshot();
    assert_eq!(reactor.state.phase(), Phase::RegionSelected);
    assert_eq!(snap.extraction_status, ExtractionStatus::Extracting);
    assert_eq!(snap.extracted_asset, None);
}

#[test]
fn test_duplicate_create_does_not_double_apply() {
    let mut reactor = loaded(20.0);
    create(&mut reactor, "a", 1.0, 2.0);
    let version = reactor.state.version;

    let effects = create(&mut reactor, "a", 1.0, 2.0);
    assert!(effects.is_empty());
    assert_eq!(reactor.state.version, version);
    assert_eq!(reactor.state.regions().len(), 1);
    assert_eq!(reactor.state.colors().peek(), ColorToken(1));
}

#[test]
fn test_selecting_current_region_is_idempotent() {
    let mut reactor = loaded(20.0);
    create(&mut reactor, "a", 1.0, 2.0);

    for _ in 0..3 {
        let effects = reactor
            .step(RegionEvent::Clicked {
                id: RegionId::new("a"),
            })
            .unwrap();
        assert_eq!(starts(&effects), 0);
    }
}

#[test]
fn test_new_selection_releases_previous_asset() {
    let mut reactor = loaded(20.0);
    let effects = create(&mut reactor, "a", 1.0, 2.0);
    let ticket_a = started(&effects).unwrap().ticket.clone();
    finish(&mut reactor, ticket_a, 1);
    assert_eq!(reactor.state.snapshot().extraction_status, ExtractionStatus::Ready);

    let effects = create(&mut reactor, "b", 5.0, 6.0);
    assert!(effects.contains(&SideEffect::ReleaseAsset(AssetHandle::from_raw(1))));
    let ticket_b = started(&effects).unwrap().ticket.clone();
    assert_eq!(ticket_b.region_id, RegionId::new("b"));

    // Back to A while B is still extracting: B is cancelled, A restarts.
    let effects = reactor
        .step(RegionEvent::Clicked {
            id: RegionId::new("a"),
        })
        .unwrap();
    assert!(effects.contains(&SideEffect::CancelExtraction(ticket_b)));
    assert_eq!(started(&effects).map(|r| r.ticket.region_id.clone()), Some(RegionId::new("a")));
}

#[test]
fn test_stale_result_is_discarded_and_released() {
    let mut reactor = loaded(20.0);
    let ticket_a = started(&create(&mut reactor, "a", 1.0, 2.0)).unwrap().ticket.clone();
    let ticket_b = started(&create(&mut reactor, "b", 5.0, 6.0)).unwrap().ticket.clone();

    // A resolves late.
    let effects = finish(&mut reactor, ticket_a, 7);
    assert!(effects.contains(&SideEffect::ReleaseAsset(AssetHandle::from_raw(7))));
    let snap = reactor.state.snapshot();
    assert_eq!(snap.extracted_asset, None);
    assert_eq!(snap.extraction_status, ExtractionStatus::Extracting);

    finish(&mut reactor, ticket_b, 8);
    let snap = reactor.state.snapshot();
    assert_eq!(snap.extracted_asset, Some(AssetHandle::from_raw(8)));
    assert_eq!(snap.region.map(|r| r.id), Some(RegionId::new("b")));
}

#[test]
fn test_resize_of_selected_region_reextracts() {
    let mut reactor = loaded(20.0);
    let ticket = started(&create(&mut reactor, "a", 1.0, 2.0)).unwrap().ticket.clone();
    finish(&mut reactor, ticket.clone(), 3);

    let effects = reactor
        .step(RegionEvent::Updated {
            id: RegionId::new("a"),
            start_seconds: 1.0,
            end_seconds: 3.0,
        })
        .unwrap();
    assert!(effects.contains(&SideEffect::ReleaseAsset(AssetHandle::from_raw(3))));
    let req = started(&effects).unwrap();
    assert_eq!(req.end_seconds, 3.0);
    assert!(req.ticket.generation > ticket.generation);

    // Same bounds again: nothing to do.
    let effects = reactor
        .step(RegionEvent::Updated {
            id: RegionId::new("a"),
            start_seconds: 1.0,
            end_seconds: 3.0,
        })
        .unwrap();
    assert!(effects.is_empty());
}

#[test]
fn test_resize_applies_min_duration_and_ignores_unselected() {
    let mut reactor = loaded(20.0);
    create(&mut reactor, "a", 1.0, 2.0);
    create(&mut reactor, "b", 5.0, 6.0);

    let effects = reactor
        .step(RegionEvent::Updated {
            id: RegionId::new("a"),
            start_seconds: 1.0,
            end_seconds: 1.01,
        })
        .unwrap();
    assert!(effects.is_empty());
    let a = reactor.state.region(&RegionId::new("a")).unwrap();
    assert!((a.duration() - MIN_REGION_SECONDS).abs() < 1e-9);
    assert!((a.midpoint() - 1.005).abs() < 1e-9);

    let err = reactor
        .step(RegionEvent::Updated {
            id: RegionId::new("zzz"),
            start_seconds: 0.0,
            end_seconds: 1.0,
        })
        .unwrap_err();
    assert_eq!(err, ValidationError::UnknownRegion(RegionId::new("zzz")));
}

#[test]
fn test_remove_selected_releases_and_returns_to_no_region() {
    let mut reactor = loaded(20.0);
    let ticket = started(&create(&mut reactor, "a", 1.0, 2.0)).unwrap().ticket.clone();
    finish(&mut reactor, ticket, 4);

    let effects = reactor
        .step(RegionEvent::Removed {
            id: RegionId::new("a"),
        })
        .unwrap();
    assert!(effects.contains(&SideEffect::ReleaseAsset(AssetHandle::from_raw(4))));
    assert_eq!(reactor.state.phase(), Phase::NoRegion);
    assert!(reactor.state.regions().is_empty());

    // Repeat callback.
    let effects = reactor
        .step(RegionEvent::Removed {
            id: RegionId::new("a"),
        })
        .unwrap();
    assert!(effects.is_empty());
}

#[test]
fn test_clear_resets_colors_and_cancels_in_flight() {
    let mut reactor = loaded(20.0);
    create(&mut reactor, "a", 1.0, 2.0);
    let ticket = started(&create(&mut reactor, "b", 3.0, 4.0)).unwrap().ticket.clone();
    assert_eq!(reactor.state.colors().peek(), ColorToken(2));

    let effects = reactor.step(RegionEvent::Cleared).unwrap();
    assert!(effects.contains(&SideEffect::CancelExtraction(ticket)));
    assert_eq!(reactor.state.phase(), Phase::NoRegion);
    assert_eq!(reactor.state.colors().peek(), ColorToken(0));

    create(&mut reactor, "c", 1.0, 2.0);
    let c = reactor.state.region(&RegionId::new("c")).unwrap();
    assert_eq!(c.color, ColorToken(0));
}

#[test]
fn test_colors_cycle_round_robin() {
    let mut reactor = loaded(100.0);
    for i in 0..REGION_PALETTE.len() + 2 {
        create(&mut reactor, &format!("r{i}"), i as f64, i as f64 + 0.5);
    }
    let colors: Vec<usize> = reactor.state.regions().iter().map(|r| r.color.0).collect();
    assert_eq!(colors, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1]);
}

#[test]
fn test_extraction_failure_keeps_region_selected() {
    let mut reactor = loaded(20.0);
    let ticket = started(&create(&mut reactor, "a", 1.0, 2.0)).unwrap().ticket.clone();

    let effects = reactor
        .step(RegionEvent::ExtractionFinished {
            ticket,
            outcome: Err(ExtractionError::Decode("bad header".to_string())),
        })
        .unwrap();
    assert!(effects.is_empty());

    let snap = reactor.state.snapshot();
    assert!(matches!(snap.extraction_status, ExtractionStatus::Failed(ref r) if r.contains("bad header")));
    assert_eq!(reactor.state.phase(), Phase::RegionSelected);
    assert!(snap.region.is_some());

    // Still resizable; a resize retries.
    let effects = reactor
        .step(RegionEvent::Updated {
            id: RegionId::new("a"),
            start_seconds: 1.0,
            end_seconds: 2.5,
        })
        .unwrap();
    assert_eq!(starts(&effects), 1);
}

#[test]
fn test_selection_without_audio_waits_for_source() {
    let mut reactor = RegionReactor::default();
    let effects = create(&mut reactor, "a", 1.0, 2.0);
    assert_eq!(starts(&effects), 0);
    assert_eq!(reactor.state.snapshot().extraction_status, ExtractionStatus::Idle);

    let effects = reactor
        .step(RegionEvent::SourceLoaded {
            duration_seconds: 20.0,
        })
        .unwrap();
    assert_eq!(starts(&effects), 1);
    assert_eq!(reactor.state.snapshot().extraction_status, ExtractionStatus::Extracting);

    let effects = reactor.step(RegionEvent::SourceUnloaded).unwrap();
    assert_eq!(
        effects
            .iter()
            .filter(|e| matches!(e, SideEffect::CancelExtraction(_)))
            .count(),
        1
    );
    assert_eq!(reactor.state.snapshot().extraction_status, ExtractionStatus::Idle);
}

#[test]
fn test_out_of_bounds_and_non_finite_are_rejected() {
    let mut reactor = loaded(20.0);
    let err = reactor
        .step(RegionEvent::Created {
            id: RegionId::new("late"),
            start_seconds: 25.0,
            end_seconds: 26.0,
        })
        .unwrap_err();
    assert!(matches!(err, ValidationError::OutOfBounds { .. }));

    assert!(reactor
        .step(RegionEvent::Created {
            id: RegionId::new("nan"),
            start_seconds: f64::NAN,
            end_seconds: 1.0,
        })
        .is_err());
    assert!(reactor.state.regions().is_empty());
    assert_eq!(reactor.state.colors().peek(), ColorToken(0));

    assert!(reactor
        .step(RegionEvent::SourceLoaded {
            duration_seconds: 0.0,
        })
        .is_err());
}

#[test]
fn test_invalid_ranges_are_rejected_before_extraction() {
    let mut reactor = loaded(20.0);
    for (start, end) in [(5.0, 3.0), (-5.0, -1.0)] {
        let err = reactor
            .step(RegionEvent::Created {
                id: RegionId::new("bad"),
                start_seconds: start,
                end_seconds: end,
            })
            .unwrap_err();
        assert!(
            matches!(
                err,
                ValidationError::EmptyRange { .. } | ValidationError::OutOfBounds { .. }
            ),
            "({start}, {end}) -> {err:?}"
        );
    }
    assert!(reactor.state.regions().is_empty());
    assert_eq!(reactor.state.phase(), Phase::NoRegion);

    // Running past the end is clamped to the audio.
    let effects = create(&mut reactor, "tail", 19.0, 40.0);
    let req = started(&effects).unwrap();
    assert_eq!((req.start_seconds, req.end_seconds), (19.0, 20.0));

    // Resizing into a reversed range leaves the region untouched.
    let err = reactor
        .step(RegionEvent::Updated {
            id: RegionId::new("tail"),
            start_seconds: 19.5,
            end_seconds: 19.0,
        })
        .unwrap_err();
    assert!(matches!(err, ValidationError::EmptyRange { .. }));
    let region = reactor.state.selected_region().unwrap();
    assert_eq!((region.start_seconds, region.end_seconds), (19.0, 20.0));
}

#[test]
fn test_drag_draft_commits_region() {
    let mut reactor = loaded(20.0);
    reactor
        .step(RegionEvent::DraftStarted { at_seconds: 5.0 })
        .unwrap();
    reactor
        .step(RegionEvent::DraftMoved { to_seconds: 4.0 })
        .unwrap();
    assert_eq!(reactor.state.phase(), Phase::RegionDrafting);

    let effects = reactor
        .step(RegionEvent::DraftFinished {
            id: RegionId::new("drag"),
        })
        .unwrap();
    assert_eq!(starts(&effects), 1);
    let region = reactor.state.selected_region().unwrap();
    assert_eq!((region.start_seconds, region.end_seconds), (4.0, 5.0));
    assert_eq!(reactor.state.phase(), Phase::RegionSelected);

    // Library fires the finish twice.
    let effects = reactor
        .step(RegionEvent::DraftFinished {
            id: RegionId::new("drag"),
        })
        .unwrap();
    assert!(effects.is_empty());
}

#[test]
fn test_cancelled_draft_leaves_no_region() {
    let mut reactor = loaded(20.0);
    reactor
        .step(RegionEvent::DraftStarted { at_seconds: 1.0 })
        .unwrap();
    reactor.step(RegionEvent::DraftCancelled).unwrap();
    assert_eq!(reactor.state.phase(), Phase::NoRegion);
    assert!(reactor.state.regions().is_empty());
}

#[test]
fn test_playback_only_tracks_current_asset() {
    let mut reactor = loaded(20.0);
    let ticket = started(&create(&mut reactor, "a", 1.0, 2.0)).unwrap().ticket.clone();
    finish(&mut reactor, ticket, 9);

    reactor
        .step(RegionEvent::Playback {
            handle: AssetHandle::from_raw(99),
            event: PlaybackEvent::Play,
        })
        .unwrap();
    assert!(!reactor.state.snapshot().is_playing_extracted);

    reactor
        .step(RegionEvent::Playback {
            handle: AssetHandle::from_raw(9),
            event: PlaybackEvent::Play,
        })
        .unwrap();
    assert!(reactor.state.snapshot().is_playing_extracted);

    reactor
        .step(RegionEvent::Playback {
            handle: AssetHandle::from_raw(9),
            event: PlaybackEvent::Finish,
        })
        .unwrap();
    assert!(!reactor.state.snapshot().is_playing_extracted);

    println!("Playback state follows player events");
}
