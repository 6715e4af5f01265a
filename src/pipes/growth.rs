//! Growth policy: where a pipe moves next and what joint covers a bend.
//!
//! Pure decision logic. All state lives in the RNG and the caller.

use crate::util::Rng;

use super::grid::{Axis, Direction};
use super::pipe::PipeStyle;

/// Kind of connector mesh placed where a pipe changes direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    /// Small sphere flush with the pipe radius
    Elbow,
    /// Larger sphere, also used as the seed joint at spawn
    Ball,
    /// The classic surprise
    Teapot,
}

/// Pick the next step direction.
///
/// An independent coin decides whether to keep going straight (long runs
/// before turns). On a turn, the direction is drawn in two stages: axis
/// first, then sign. That is deliberately not a uniform pick over the six
/// directions combined with the straight bias; the straight/turn split is
/// its own coin layered on top.
pub fn choose_direction(rng: &mut Rng, last: Option<Direction>) -> Direction {
    // The coin is flipped even when there is no history, matching the
    // two-stage draw's consumption of randomness.
    let keep_straight = rng.chance(0.5);
    if keep_straight {
        if let Some(dir) = last {
            return dir;
        }
    }
    let axis = *rng.choose(&Axis::ALL);
    let sign = *rng.choose(&[1, -1]);
    Direction { axis, sign }
}

/// Pick the joint for a direction change.
///
/// Nested fallthrough, not additive: the teapot draw happens first and is
/// exclusive of the others.
pub fn choose_joint(rng: &mut Rng, style: &PipeStyle) -> JointKind {
    if rng.chance(style.teapot_chance) {
        JointKind::Teapot
    } else if rng.chance(style.ball_joint_chance) {
        JointKind::Ball
    } else {
        JointKind::Elbow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipes::grid::GridCoord;

    fn style(ball: f32, teapot: f32) -> PipeStyle {
        PipeStyle {
            ball_joint_chance: ball,
            teapot_chance: teapot,
            texture_path: None,
            hue: 0.0,
        }
    }

    #[test]
    fn test_straight_bias_roughly_half() {
        let mut rng = Rng::new(2024);
        let last = Direction::between(GridCoord::new(0, 0, 0), GridCoord::new(1, 0, 0));
        assert!(last.is_some());

        let trials = 20_000;
        let kept = (0..trials)
            .filter(|_| choose_direction(&mut rng, last) == last.unwrap())
            .count();
        // 50% straight plus 1/6 of the turn draws landing on the same
        // direction again: expect about 58%.
        let expected = trials as f32 * (0.5 + 0.5 / 6.0);
        let tolerance = trials as f32 * 0.02;
        assert!(
            ((kept as f32) - expected).abs() < tolerance,
            "kept {} of {}, expected about {}",
            kept,
            trials,
            expected
        );
    }

    #[test]
    fn test_turn_draw_covers_all_six_uniformly() {
        let mut rng = Rng::new(77);
        let trials = 30_000;
        let mut counts = [0usize; 6];
        for _ in 0..trials {
            // No history: every draw goes through the two-stage pick.
            let d = choose_direction(&mut rng, None);
            let idx = Direction::ALL.iter().position(|&x| x == d).unwrap();
            counts[idx] += 1;
        }
        let expected = trials as f32 / 6.0;
        for (i, &c) in counts.iter().enumerate() {
            assert!(
                ((c as f32) - expected).abs() < expected * 0.15,
                "direction {} drawn {} times, expected about {}",
                i,
                c,
                expected
            );
        }
    }

    #[test]
    fn test_joint_certain_ball() {
        let mut rng = Rng::new(3);
        for _ in 0..100 {
            assert_eq!(choose_joint(&mut rng, &style(1.0, 0.0)), JointKind::Ball);
        }
    }

    #[test]
    fn test_joint_elbow_when_no_chances() {
        let mut rng = Rng::new(4);
        for _ in 0..100 {
            assert_eq!(choose_joint(&mut rng, &style(0.0, 0.0)), JointKind::Elbow);
        }
    }

    #[test]
    fn test_joint_teapot_takes_precedence() {
        let mut rng = Rng::new(5);
        for _ in 0..100 {
            assert_eq!(choose_joint(&mut rng, &style(1.0, 1.0)), JointKind::Teapot);
        }
    }
}
