use super::types::{AnimationPlayer, TickDelta};
use bevy_ecs::prelude::{Query, Res};

/// Advances playback clocks for every live animation player. Replay resets
/// `elapsed` to zero out of band; this system only integrates time.
pub fn sys_advance_animation_players(delta: Res<TickDelta>, mut players: Query<&mut AnimationPlayer>) {
    let dt = delta.0;
    if dt <= 0.0 {
        return;
    }
    for mut player in players.iter_mut() {
        if player.playing {
            let advance = dt * player.speed;
            player.elapsed += advance;
        }
    }
}
