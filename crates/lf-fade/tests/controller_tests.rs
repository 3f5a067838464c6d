//! Controller-level behavior: registry lifecycle, definition updates,
//! event gating, custom-event enumeration, and scheduled preloading.

mod common;

use common::{Command, FakeGame, SharedFactory};

use lf_core::CrossfadeSettings;
use lf_fade::{
    CrossfadeController, PlayableSound, Playlist, PlaylistMode, SoundLayer, SoundUpdate,
};
use lf_trigger::{Disposition, TriggerTag};

fn hostile_tag() -> TriggerTag {
    TriggerTag::new("COMBATANT", Some("HOSTILE"))
}

fn setup() -> (SharedFactory, CrossfadeController, FakeGame) {
    let factory = SharedFactory::new();
    let controller = CrossfadeController::new(Box::new(factory.clone()));
    (factory, controller, FakeGame::default())
}

fn playing_sound(id: u64, base: &str, layer: &str) -> PlayableSound {
    let mut sound = PlayableSound::new(id, base)
        .with_volume(0.8)
        .with_layers(vec![SoundLayer::new(layer, vec![hostile_tag()])]);
    sound.playing = true;
    sound
}

fn spin_up(controller: &mut CrossfadeController, factory: &SharedFactory, id: u64, srcs: &[&str]) {
    let game = FakeGame::default();
    controller.sync_sound(id, &game);
    for src in srcs {
        factory.complete_load(src);
    }
    controller.handle_started(id, srcs[0], &game);
}

#[test]
fn test_definition_update_discards_stale_handles() {
    let (factory, mut controller, game) = setup();
    controller.register_sound(playing_sound(1, "base.ogg", "old.ogg"));
    spin_up(&mut controller, &factory, 1, &["base.ogg", "old.ogg"]);
    assert!(factory.playing("old.ogg"));

    controller.update_sound(
        1,
        SoundUpdate {
            layers: Some(vec![SoundLayer::new("new.ogg", vec![hostile_tag()])]),
            ..Default::default()
        },
        &game,
    );

    // The replaced layer handle is stopped, the new one spun up
    assert!(!factory.playing("old.ogg"));
    assert!(factory.commands("old.ogg").contains(&Command::Stop));
    assert_eq!(factory.load_count("new.ogg"), 1);
    // Base keeps playing through the rebuild
    assert!(factory.playing("base.ogg"));
}

#[test]
fn test_remove_sound_stops_every_handle() {
    let (factory, mut controller, _game) = setup();
    controller.register_sound(playing_sound(1, "base.ogg", "a.ogg"));
    spin_up(&mut controller, &factory, 1, &["base.ogg", "a.ogg"]);

    controller.remove_sound(1);
    assert!(!factory.playing("base.ogg"));
    assert!(!factory.playing("a.ogg"));
    assert!(controller.sound(1).is_none());
}

#[test]
fn test_remove_playlist_stops_member_sounds() {
    let (factory, mut controller, _game) = setup();
    controller.register_sound(playing_sound(1, "one.ogg", "one-layer.ogg"));
    controller.register_sound(playing_sound(2, "two.ogg", "two-layer.ogg"));
    controller
        .register_playlist(Playlist::new(5, PlaylistMode::Sequential).with_order(vec![1, 2]));
    spin_up(&mut controller, &factory, 1, &["one.ogg", "one-layer.ogg"]);
    spin_up(&mut controller, &factory, 2, &["two.ogg", "two-layer.ogg"]);

    controller.remove_playlist(5);
    for src in ["one.ogg", "one-layer.ogg", "two.ogg", "two-layer.ogg"] {
        assert!(!factory.playing(src), "{src} should be stopped");
    }
}

#[test]
fn test_combat_events_gate_combat_hooks() {
    let (factory, _, mut game) = setup();
    let settings = CrossfadeSettings {
        combat_events: false,
        ..Default::default()
    };
    let mut controller = CrossfadeController::with_settings(Box::new(factory.clone()), settings);
    controller.register_sound(playing_sound(1, "base.ogg", "a.ogg"));
    spin_up(&mut controller, &factory, 1, &["base.ogg", "a.ogg"]);

    game.combat = true;
    game.disposition = Some(Disposition::Hostile);
    let fades_before = factory.commands("a.ogg").len();
    controller.on_combat_update(&game);
    assert_eq!(factory.commands("a.ogg").len(), fades_before);

    // The pause hook is not gated by the combat switch
    controller.on_pause_toggle(&game);
    assert!(factory.commands("a.ogg").len() > fades_before);
}

#[test]
fn test_crossfade_disabled_keeps_base_audible() {
    let (factory, _, mut game) = setup();
    let settings = CrossfadeSettings {
        enabled: false,
        ..Default::default()
    };
    let mut controller = CrossfadeController::with_settings(Box::new(factory.clone()), settings);
    controller.register_sound(playing_sound(1, "base.ogg", "a.ogg"));
    spin_up(&mut controller, &factory, 1, &["base.ogg", "a.ogg"]);

    game.combat = true;
    game.disposition = Some(Disposition::Hostile);
    controller.on_pause_toggle(&game);
    assert_eq!(factory.volume("base.ogg"), 0.8);
    assert_eq!(factory.volume("a.ogg"), 0.0);
}

#[test]
fn test_custom_event_enumeration() {
    let (_factory, mut controller, _game) = setup();
    let mut quiet = PlayableSound::new(1, "one.ogg").with_layers(vec![SoundLayer::new(
        "one-layer.ogg",
        vec![TriggerTag::new("CUSTOM", Some("Dungeon"))],
    )]);
    quiet.playing = false;
    controller.register_sound(quiet);

    let mut loud = PlayableSound::new(2, "two.ogg").with_layers(vec![SoundLayer::new(
        "two-layer.ogg",
        vec![
            TriggerTag::new("CUSTOM", Some("Boss")),
            TriggerTag::new("CUSTOM", Some("Arena")),
        ],
    )]);
    loud.playing = true;
    controller.register_sound(loud);

    assert_eq!(
        controller.all_custom_events(true),
        vec!["ARENA", "BOSS", "DUNGEON"]
    );
    assert_eq!(controller.playing_custom_events(true), vec!["ARENA", "BOSS"]);
}

#[test]
fn test_set_custom_event_normalizes_and_clears() {
    let (_factory, mut controller, game) = setup();
    controller.set_custom_event(Some("  Boss "), &game);
    assert_eq!(controller.custom_event().as_deref(), Some("Boss"));

    controller.set_custom_event(Some("   "), &game);
    assert_eq!(controller.custom_event(), None);
}

#[test]
fn test_scheduled_preload_fires_inside_preroll_window() {
    let (factory, _, _game) = setup();
    let settings = CrossfadeSettings {
        auto_preload_seconds: Some(5.0),
        ..Default::default()
    };
    let mut controller = CrossfadeController::with_settings(Box::new(factory.clone()), settings);

    controller.register_sound(playing_sound(1, "one.ogg", "one-layer.ogg"));
    controller.register_sound(playing_sound(2, "two.ogg", "two-layer.ogg"));
    controller
        .register_playlist(Playlist::new(5, PlaylistMode::Sequential).with_order(vec![1, 2]));

    factory.state("one.ogg").borrow_mut().duration = Some(30.0);
    spin_up(&mut controller, &factory, 1, &["one.ogg", "one-layer.ogg"]);
    controller.on_sound_start(5, 1, 0.0);

    // Too early: nothing fires
    controller.poll_scheduled(10_000.0);
    assert_eq!(factory.load_count("two.ogg"), 0);

    // Inside the pre-roll window the next track's handles start decoding
    controller.poll_scheduled(25_500.0);
    assert_eq!(
        factory.commands("two.ogg"),
        vec![Command::Load { autoplay: false }]
    );
    assert_eq!(
        factory.commands("two-layer.ogg"),
        vec![Command::Load { autoplay: false }]
    );
    assert!(!factory.playing("two.ogg"));
}

#[test]
fn test_scheduled_preload_guard_checks_fire_time_state() {
    let (factory, _, _game) = setup();
    let settings = CrossfadeSettings {
        auto_preload_seconds: Some(5.0),
        ..Default::default()
    };
    let mut controller = CrossfadeController::with_settings(Box::new(factory.clone()), settings);

    controller.register_sound(playing_sound(1, "one.ogg", "one-layer.ogg"));
    controller.register_sound(playing_sound(2, "two.ogg", "two-layer.ogg"));
    controller
        .register_playlist(Playlist::new(5, PlaylistMode::Sequential).with_order(vec![1, 2]));

    factory.state("one.ogg").borrow_mut().duration = Some(30.0);
    spin_up(&mut controller, &factory, 1, &["one.ogg", "one-layer.ogg"]);
    controller.on_sound_start(5, 1, 0.0);

    // The track was stopped before the timer fired: the preload is a no-op
    factory.state("one.ogg").borrow_mut().playing = false;
    controller.poll_scheduled(25_500.0);
    assert_eq!(factory.load_count("two.ogg"), 0);
}

#[test]
fn test_preload_playlist_warms_all_handles() {
    let (factory, mut controller, _game) = setup();
    let mut sound = playing_sound(1, "one.ogg", "one-layer.ogg");
    sound.playing = false;
    controller.register_sound(sound);
    controller.register_playlist(Playlist::new(5, PlaylistMode::Disabled).with_order(vec![1]));

    controller.preload_playlist(5);
    assert_eq!(factory.load_count("one.ogg"), 1);
    assert_eq!(factory.load_count("one-layer.ogg"), 1);
    assert!(!factory.playing("one.ogg"));
}

#[test]
fn test_missing_base_is_contained() {
    let (_factory, mut controller, game) = setup();
    let mut sound = PlayableSound::new(1, "").with_layers(vec![SoundLayer::new(
        "a.ogg",
        vec![hostile_tag()],
    )]);
    sound.playing = true;
    controller.register_sound(sound);

    // Logs and skips; other sounds are unaffected and nothing panics
    controller.sync_sound(1, &game);
    controller.crossfade_playlists(&game);
}

#[test]
fn test_stray_notifications_are_ignored() {
    let (factory, mut controller, game) = setup();
    controller.register_sound(playing_sound(1, "base.ogg", "a.ogg"));
    spin_up(&mut controller, &factory, 1, &["base.ogg", "a.ogg"]);

    // Notifications for unknown sounds or handles are diagnostic no-ops
    controller.fade_completed(1, "nope.ogg");
    controller.fade_completed(99, "base.ogg");
    controller.handle_started(99, "base.ogg", &game);
    assert!(factory.playing("base.ogg"));
}

#[test]
fn test_refade_to_volume_previews_without_persisting() {
    let (factory, mut controller, game) = setup();
    controller.register_sound(playing_sound(1, "base.ogg", "a.ogg"));
    spin_up(&mut controller, &factory, 1, &["base.ogg", "a.ogg"]);

    controller.refade_to_volume(1, 0.25, &game);
    assert_eq!(factory.volume("base.ogg"), 0.25);
    assert_eq!(factory.volume("a.ogg"), 0.0);
    // The stored nominal volume is untouched
    assert_eq!(controller.sound(1).unwrap().volume, 0.8);
}

#[test]
fn test_failed_layer_triggers_resync_with_exclusion() {
    let (factory, mut controller, mut game) = setup();
    controller.register_sound(playing_sound(1, "base.ogg", "a.ogg"));
    spin_up(&mut controller, &factory, 1, &["base.ogg", "a.ogg"]);

    game.combat = true;
    game.disposition = Some(Disposition::Hostile);
    controller.on_combat_update(&game);
    assert_eq!(factory.volume("a.ogg"), 0.8);

    {
        let state = factory.state("a.ogg");
        let mut state = state.borrow_mut();
        state.failed = true;
        state.playing = false;
    }
    controller.handle_failed(1, "a.ogg", &game);

    // With the only hostile layer gone the base takes over again
    assert_eq!(factory.volume("base.ogg"), 0.8);
}
