use crate::{
    difficulty::Difficulty,
    objects::{HitObject, Vec2},
};

/// Objects closer than this (osu!pixels) count as coincident.
const STACK_DISTANCE: f64 = 3.0;

/// Assigns stack indices and offsets to a sorted, numbered and timed object
/// list, in place.
pub trait StackResolver {
    fn resolve(&self, objects: &mut [HitObject], difficulty: &Difficulty, stack_leniency: f64);
}

/// Classic stacking: walking backwards, an earlier object that sits on top of
/// the current one within the stack threshold gets pushed one level up.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardStackResolver;

impl StackResolver for StandardStackResolver {
    fn resolve(&self, objects: &mut [HitObject], difficulty: &Difficulty, stack_leniency: f64) {
        let threshold = difficulty.preempt() * stack_leniency;

        for i in (0..objects.len()).rev() {
            if objects[i].stack_index != 0 || !stackable(&objects[i]) {
                continue;
            }

            let mut current = i;
            for n in (0..i).rev() {
                if !stackable(&objects[n]) {
                    continue;
                }
                let gap = objects[current].start_time.saturating_sub(objects[n].end_time);
                if gap as f64 > threshold {
                    break;
                }
                if objects[n].position.distance(objects[current].position) < STACK_DISTANCE {
                    objects[n].stack_index = objects[current].stack_index + 1;
                    current = n;
                }
            }
        }

        let step = difficulty.circle_radius() / 10.0;
        for object in objects.iter_mut() {
            let offset = -(object.stack_index as f64) * step;
            object.stack_offset = Vec2::new(offset, offset);
        }
    }
}

fn stackable(object: &HitObject) -> bool {
    !object.is_pause() && !object.is_spinner()
}
