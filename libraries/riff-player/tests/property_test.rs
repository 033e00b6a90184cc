//! Property-based tests for the player controller
//!
//! Uses proptest to check invariants across random playlists and action
//! sequences.

mod common;

use common::{controller, finish_load, finish_track, playing_controller};
use proptest::prelude::*;
use riff_player::{PlayerOptions, PlayerStatus};
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Action {
    Next,
    Previous,
    Load(usize),
    FinishLoad,
    FailLoad,
    FinishTrack,
    Pause,
    Play,
    Stop,
    ToggleShuffle,
    ToggleLoop,
}

fn arbitrary_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Next),
        Just(Action::Previous),
        (0usize..12).prop_map(Action::Load),
        Just(Action::FinishLoad),
        Just(Action::FailLoad),
        Just(Action::FinishTrack),
        Just(Action::Pause),
        Just(Action::Play),
        Just(Action::Stop),
        Just(Action::ToggleShuffle),
        Just(Action::ToggleLoop),
    ]
}

fn seeded(seed: u64) -> PlayerOptions {
    PlayerOptions {
        shuffle_seed: Some(seed),
        ..PlayerOptions::default()
    }
}

proptest! {
    /// Property: `track_count` nexts return to the start, visiting each index once
    #[test]
    fn next_is_cyclic(count in 1usize..20, start in 0usize..20) {
        let start = start % count;
        let (mut player, script) = playing_controller(count, PlayerOptions::default());
        player.load(start);
        finish_load(&mut player, &script);

        let mut visited = HashSet::new();
        for _ in 0..count {
            player.next();
            visited.insert(player.current_index());
            finish_load(&mut player, &script);
        }

        prop_assert_eq!(player.current_index(), start);
        prop_assert_eq!(visited.len(), count);
    }

    /// Property: a shuffle cycle visits every other index exactly once
    #[test]
    fn shuffle_cycle_has_no_repeats(count in 2usize..16, seed in any::<u64>()) {
        let (mut player, script) = playing_controller(count, seeded(seed));
        player.toggle_shuffle();

        let mut visited = Vec::new();
        for _ in 0..count - 1 {
            player.next();
            prop_assert!(!player.remaining_shuffle_indices().contains(&player.current_index()));
            visited.push(player.current_index());
            finish_load(&mut player, &script);
        }

        let unique: HashSet<usize> = visited.iter().copied().collect();
        prop_assert_eq!(unique.len(), count - 1);
        prop_assert!(!unique.contains(&0));
    }

    /// Property: controller invariants hold after any action sequence
    #[test]
    fn invariants_hold_for_any_actions(
        count in 1usize..8,
        seed in any::<u64>(),
        actions in prop::collection::vec(arbitrary_action(), 1..60)
    ) {
        let (mut player, script) = controller(count, seeded(seed));

        for action in actions {
            let index_before = player.current_index();
            let loads_before = script.load_count();

            match action {
                Action::Next => player.next(),
                Action::Previous => player.previous(),
                Action::Load(index) => player.load(index),
                Action::FinishLoad => finish_load(&mut player, &script),
                Action::FailLoad => {
                    script.last_notifier().load_failed("broken");
                    player.process_notifications();
                }
                Action::FinishTrack => finish_track(&mut player, &script),
                Action::Pause => player.pause(),
                Action::Play => player.play(),
                Action::Stop => player.stop(),
                Action::ToggleShuffle => player.toggle_shuffle(),
                Action::ToggleLoop => player.toggle_loop(),
            }

            prop_assert!(player.current_index() < count);
            prop_assert!(!player.remaining_shuffle_indices().contains(&player.current_index()));
            if !player.is_shuffle() {
                prop_assert!(player.remaining_shuffle_indices().is_empty());
            }

            // Every new instance means Loading at time 0 with the old one released
            if script.load_count() > loads_before {
                prop_assert_eq!(player.status(), PlayerStatus::Loading);
                prop_assert_eq!(player.current_time(), 0.0);
                prop_assert_eq!(script.released().len(), script.load_count() - 1);
            } else {
                prop_assert_eq!(player.current_index(), index_before);
            }

            match player.status() {
                PlayerStatus::Error => prop_assert!(player.error_message().is_some()),
                PlayerStatus::Loading => {}
                _ => prop_assert!(player.error_message().is_none()),
            }
        }
    }

    /// Property: skipping never leaves `[0, duration]`
    #[test]
    fn skip_stays_within_track(
        duration in 1.0f64..7200.0,
        positions in prop::collection::vec(-100.0f64..8000.0, 1..30),
        forward in prop::collection::vec(any::<bool>(), 30)
    ) {
        let (mut player, script) = controller(1, PlayerOptions::default());
        script.set_duration(duration);
        finish_load(&mut player, &script);

        for (position, forward) in positions.into_iter().zip(forward) {
            script.set_position(position);
            if forward {
                player.increase_time();
            } else {
                player.decrease_time();
            }
            prop_assert!(player.current_time() >= 0.0);
            prop_assert!(player.current_time() <= duration);
        }
    }

    /// Property: speed is accepted exactly on `(0, 2]`
    #[test]
    fn speed_acceptance(speed in -5.0f32..5.0) {
        let (mut player, _script) = playing_controller(1, PlayerOptions::default());

        player.set_speed(speed);

        if speed > 0.0 && speed <= 2.0 {
            prop_assert_eq!(player.speed(), speed);
        } else {
            prop_assert_eq!(player.speed(), 1.0);
        }
    }

    /// Property: mute then unmute restores the exact volume
    #[test]
    fn mute_round_trip(level in 0u8..=100, muted_changes in prop::collection::vec(0u8..=100, 0..3)) {
        let (mut player, _script) = playing_controller(1, PlayerOptions::default());
        player.change_volume(level);

        player.mute();
        prop_assert_eq!(player.volume(), level);
        player.unmute();

        prop_assert!(!player.is_muted());
        prop_assert_eq!(player.volume(), level);

        player.mute();
        for change in muted_changes {
            player.change_volume(change);
            if change > 0 {
                prop_assert!(!player.is_muted());
            }
        }
    }
}
