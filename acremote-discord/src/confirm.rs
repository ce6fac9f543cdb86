use std::collections::HashMap;

pub type Token = u64;

const PREFIX: &str = "confirm";

/// Where a command that needs a yes/no answer stands.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation<C> {
    Pending(Token),
    Confirmed(C),
    Cancelled(C),
}

/// One outstanding confirmation per user. A new request replaces the old
/// one, and answers carrying a stale token leave the newer one pending.
#[derive(Debug)]
pub struct Confirmations<C> {
    pending: HashMap<u64, (Token, C)>,
    next_token: Token,
}

impl<C> Default for Confirmations<C> {
    fn default() -> Self {
        Confirmations {
            pending: HashMap::new(),
            next_token: 1,
        }
    }
}

impl<C> Confirmations<C> {
    pub fn request(&mut self, user: u64, command: C) -> Token {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        if self.pending.insert(user, (token, command)).is_some() {
            debug!("replacing pending confirmation of user {}", user);
        }
        token
    }

    /// `None` when the user has nothing pending. An answer to a replaced
    /// request reports the newer one as still pending.
    pub fn answer(&mut self, user: u64, token: Token, yes: bool) -> Option<Confirmation<C>> {
        match self.pending.get(&user) {
            None => return None,
            Some((pending, _)) if *pending != token => return Some(Confirmation::Pending(*pending)),
            Some(_) => {}
        }
        let (_, command) = self.pending.remove(&user)?;
        Some(if yes {
            Confirmation::Confirmed(command)
        } else {
            Confirmation::Cancelled(command)
        })
    }

    pub fn is_pending(&self, user: u64) -> bool {
        self.pending.contains_key(&user)
    }
}

pub fn custom_id(token: Token, yes: bool) -> String {
    format!("{}:{}:{}", PREFIX, token, u8::from(yes))
}

/// Reads back an id made by [`custom_id`].
pub fn parse_custom_id(id: &str) -> Option<(Token, bool)> {
    let mut parts = id.split(':');
    if parts.next()? != PREFIX {
        return None;
    }
    let token = parts.next()?.parse().ok()?;
    let yes = match parts.next()? {
        "1" => true,
        "0" => false,
        _ => return None,
    };
    parts.next().is_none().then(|| (token, yes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_runs_no_cancels() {
        let mut confirmations = Confirmations::default();
        let token = confirmations.request(7, "off");
        assert!(confirmations.is_pending(7));
        assert_eq!(
            confirmations.answer(7, token, true),
            Some(Confirmation::Confirmed("off"))
        );
        assert!(!confirmations.is_pending(7));
        assert_eq!(confirmations.answer(7, token, true), None);

        let token = confirmations.request(7, "on");
        assert_eq!(
            confirmations.answer(7, token, false),
            Some(Confirmation::Cancelled("on"))
        );
    }

    #[test]
    fn newer_request_replaces_older() {
        let mut confirmations = Confirmations::default();
        let first = confirmations.request(1, "on");
        let second = confirmations.request(1, "off");
        assert_ne!(first, second);
        assert_eq!(
            confirmations.answer(1, first, true),
            Some(Confirmation::Pending(second))
        );
        assert_eq!(
            confirmations.answer(1, second, true),
            Some(Confirmation::Confirmed("off"))
        );
    }

    #[test]
    fn answers_are_per_user() {
        let mut confirmations = Confirmations::default();
        let token = confirmations.request(1, "restart");
        assert_eq!(confirmations.answer(2, token, true), None);
        assert!(confirmations.is_pending(1));
    }

    #[test]
    fn custom_ids() {
        assert_eq!(custom_id(12, true), "confirm:12:1");
        assert_eq!(parse_custom_id("confirm:12:1"), Some((12, true)));
        assert_eq!(parse_custom_id("confirm:3:0"), Some((3, false)));
        assert_eq!(parse_custom_id("confirm:3:2"), None);
        assert_eq!(parse_custom_id("cmd:on"), None);
        assert_eq!(parse_custom_id("confirm:x:1"), None);
        assert_eq!(parse_custom_id("confirm:3:1:9"), None);
    }
}
