//! Rising-edge detection over the held key state the host reports.

use shared::{Controls, Keys};

#[derive(Debug, Clone, Copy, Default)]
pub struct Edges {
    pub accelerate: bool,
    pub brake: bool,
    pub keys: Keys,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    last: Controls,
}

impl EdgeDetector {
    /// Returns which controls went down this tick.
    pub fn update(&mut self, controls: &Controls) -> Edges {
        let last = self.last;
        self.last = *controls;
        let rose = |now: bool, before: bool| now && !before;
        let (k, p) = (&controls.keys, &last.keys);
        Edges {
            accelerate: rose(controls.accelerate, last.accelerate),
            brake: rose(controls.brake, last.brake),
            keys: Keys {
                engine: rose(k.engine, p.engine),
                cruise: rose(k.cruise, p.cruise),
                cruise_resume: rose(k.cruise_resume, p.cruise_resume),
                cruise_faster: rose(k.cruise_faster, p.cruise_faster),
                cruise_slower: rose(k.cruise_slower, p.cruise_slower),
                left_indicator: rose(k.left_indicator, p.left_indicator),
                right_indicator: rose(k.right_indicator, p.right_indicator),
                hazard: rose(k.hazard, p.hazard),
                race_mode: rose(k.race_mode, p.race_mode),
                direction_switch: rose(k.direction_switch, p.direction_switch),
                up_shift: rose(k.up_shift, p.up_shift),
                down_shift: rose(k.down_shift, p.down_shift),
            },
        }
    }
}
