use shared::IndicatorState;

#[derive(Debug, Clone, Copy, Default)]
pub struct Indicators {
    pub state: IndicatorState,
    armed: bool,
}

impl Indicators {
    pub fn new(state: IndicatorState) -> Self {
        Self { state, armed: false }
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn toggle(&mut self, left: bool, right: bool, hazard: bool) {
        if left {
            self.flip(IndicatorState::Left);
        }
        if right {
            self.flip(IndicatorState::Right);
        }
        if hazard {
            self.flip(IndicatorState::Hazard);
        }
    }

    fn flip(&mut self, to: IndicatorState) {
        self.state = if self.state == to { IndicatorState::Off } else { to };
    }

    /// Cancels a turn signal once the wheel has been turned past `arm` in
    /// the signalled direction and brought back under `release`.
    /// Positive steering is left.
    pub fn auto_cancel(&mut self, steering: f32, arm: f32, release: f32) {
        let toward = match self.state {
            IndicatorState::Left => Some(steering),
            IndicatorState::Right => Some(-steering),
            _ => None,
        };
        match toward {
            Some(s) if s >= arm && (!self.armed || self.state == IndicatorState::Right) => {
                self.armed = true;
            }
            Some(s) if self.armed && s <= release => {
                self.state = IndicatorState::Off;
                self.armed = false;
            }
            None if self.armed => self.armed = false,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_toggle_their_own_state() {
        let mut indicators = Indicators::default();
        indicators.toggle(true, false, false);
        assert_eq!(indicators.state, IndicatorState::Left);
        indicators.toggle(false, true, false);
        assert_eq!(indicators.state, IndicatorState::Right);
        indicators.toggle(false, true, false);
        assert_eq!(indicators.state, IndicatorState::Off);
        indicators.toggle(false, false, true);
        assert_eq!(indicators.state, IndicatorState::Hazard);
        indicators.toggle(true, false, false);
        assert_eq!(indicators.state, IndicatorState::Left);
    }

    #[test]
    fn turn_then_straighten_cancels() {
        let mut indicators = Indicators::new(IndicatorState::Left);
        for s in [0.2, 0.4, 0.55, 0.7, 0.3, 0.1].iter() {
            indicators.auto_cancel(*s, 0.5, 0.15);
        }
        assert_eq!(indicators.state, IndicatorState::Off);
        assert!(!indicators.armed());
    }

    #[test]
    fn wobble_without_release_keeps_signal() {
        let mut indicators = Indicators::new(IndicatorState::Left);
        for i in 0..40 {
            let s = if i % 2 == 0 { 0.2 } else { 0.4 };
            indicators.auto_cancel(s, 0.5, 0.15);
        }
        assert_eq!(indicators.state, IndicatorState::Left);

        indicators.auto_cancel(0.6, 0.5, 0.15);
        for i in 0..40 {
            let s = if i % 2 == 0 { 0.2 } else { 0.4 };
            indicators.auto_cancel(s, 0.5, 0.15);
        }
        assert_eq!(indicators.state, IndicatorState::Left);
        assert!(indicators.armed());
    }

    #[test]
    fn right_signal_uses_negative_steering() {
        let mut indicators = Indicators::new(IndicatorState::Right);
        indicators.auto_cancel(0.8, 0.5, 0.15);
        assert!(!indicators.armed());
        indicators.auto_cancel(-0.8, 0.5, 0.15);
        assert!(indicators.armed());
        indicators.auto_cancel(0.0, 0.5, 0.15);
        assert_eq!(indicators.state, IndicatorState::Off);
    }

    #[test]
    fn switching_off_disarms() {
        let mut indicators = Indicators::new(IndicatorState::Left);
        indicators.auto_cancel(0.7, 0.5, 0.15);
        assert!(indicators.armed());
        indicators.toggle(true, false, false);
        indicators.auto_cancel(0.7, 0.5, 0.15);
        assert!(!indicators.armed());
    }
}
