//! Back/forward history of operator-entered addresses.

/// Addresses as the operator typed them, with the one on screen in
/// `current`.
#[derive(Debug, Default)]
pub struct History {
    back: Vec<String>,
    forward: Vec<String>,
    current: Option<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh visit discards anything ahead of the current entry.
    pub fn push(&mut self, address: &str) {
        self.back.extend(self.current.replace(address.to_string()));
        self.forward.clear();
    }

    pub fn go_back(&mut self) -> Option<String> {
        Self::step(&mut self.back, &mut self.forward, &mut self.current)
    }

    pub fn go_forward(&mut self) -> Option<String> {
        Self::step(&mut self.forward, &mut self.back, &mut self.current)
    }

    /// Move the top of `from` into `current`, parking the old entry on `to`.
    fn step(
        from: &mut Vec<String>,
        to: &mut Vec<String>,
        current: &mut Option<String>,
    ) -> Option<String> {
        let target = from.pop()?;
        to.extend(current.replace(target.clone()));
        Some(target)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }
}
