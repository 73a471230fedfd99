use crate::metrics::NetworkFact;

/// Which network fact is on screen, advanced every `interval` committed ticks.
///
/// The fact list is rebuilt every tick, so the cursor is always reduced
/// modulo the current length when read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRotation {
    cursor: usize,
    ticks: u32,
    interval: u32,
}

impl NetworkRotation {
    pub fn new(interval: u32) -> Self {
        Self {
            cursor: 0,
            ticks: 0,
            interval,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn ticks_since_rotate(&self) -> u32 {
        self.ticks
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// The fact to show this tick; falls back to "No network" for an empty list.
    pub fn current(&self, facts: &[NetworkFact]) -> NetworkFact {
        if facts.is_empty() {
            return NetworkFact::no_network();
        }
        facts[self.cursor % facts.len()].clone()
    }

    /// Record one committed tick. `fact_count` is the length of this tick's list.
    pub fn tick(&mut self, fact_count: usize) {
        self.ticks += 1;
        if self.ticks >= self.interval {
            self.cursor = (self.cursor + 1) % fact_count.max(1);
            self.ticks = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FactKind;

    fn facts() -> Vec<NetworkFact> {
        vec![
            NetworkFact::hostname("pi-test"),
            NetworkFact::new(FactKind::Lan, "192.168.1.20"),
            NetworkFact::new(FactKind::Wifi, "10.0.0.9"),
        ]
    }

    #[test]
    fn each_fact_stays_for_the_interval() {
        let facts = facts();
        let mut rotation = NetworkRotation::new(3);
        let mut shown = Vec::new();
        for _ in 0..9 {
            shown.push(rotation.current(&facts).value);
            rotation.tick(facts.len());
        }
        assert_eq!(
            shown,
            vec![
                "pi-test", "pi-test", "pi-test", "192.168.1.20", "192.168.1.20",
                "192.168.1.20", "10.0.0.9", "10.0.0.9", "10.0.0.9"
            ]
        );
        assert_eq!(rotation.cursor(), 0);
    }

    #[test]
    fn cursor_after_three_and_six_ticks() {
        let mut rotation = NetworkRotation::new(3);
        for _ in 0..3 {
            rotation.tick(3);
        }
        assert_eq!(rotation.cursor(), 1);
        assert_eq!(rotation.ticks_since_rotate(), 0);
        for _ in 0..3 {
            rotation.tick(3);
        }
        assert_eq!(rotation.cursor(), 2);
    }

    #[test]
    fn single_fact_never_moves_off_index_zero() {
        let facts = vec![NetworkFact::hostname("pi-test")];
        let mut rotation = NetworkRotation::new(1);
        for _ in 0..5 {
            assert_eq!(rotation.current(&facts).value, "pi-test");
            rotation.tick(facts.len());
            assert_eq!(rotation.cursor(), 0);
        }
    }

    #[test]
    fn shrinking_list_wraps_cursor() {
        let mut rotation = NetworkRotation::new(1);
        rotation.tick(3);
        rotation.tick(3);
        assert_eq!(rotation.cursor(), 2);
        let fewer = vec![
            NetworkFact::hostname("pi-test"),
            NetworkFact::new(FactKind::Lan, "192.168.1.20"),
        ];
        assert_eq!(rotation.current(&fewer).value, "pi-test");
        rotation.tick(fewer.len());
        assert!(rotation.cursor() < fewer.len());
    }

    #[test]
    fn empty_list_shows_no_network() {
        let mut rotation = NetworkRotation::new(2);
        let fact = rotation.current(&[]);
        assert_eq!(fact, NetworkFact::no_network());
        rotation.tick(0);
        rotation.tick(0);
        assert_eq!(rotation.cursor(), 0);
    }
}
