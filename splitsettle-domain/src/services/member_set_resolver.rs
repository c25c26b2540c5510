use crate::model::{MemberSet, Payer, PersonRegistry};

/// Resolves who paid and who benefited against the final person registry.
pub struct MemberSetResolver<'r, 'a> {
    registry: &'r PersonRegistry<'a>,
}

impl<'r, 'a> MemberSetResolver<'r, 'a> {
    pub fn new(registry: &'r PersonRegistry<'a>) -> Self {
        Self { registry }
    }

    pub fn paying_set(&self, payer: Payer<'a>) -> MemberSet<'a> {
        match payer {
            Payer::Person(name) => MemberSet::new(vec![name]),
            Payer::CashPool => self.registry.members(),
        }
    }

    pub fn benefiting_set(&self, involved: Option<&[&'a str]>) -> MemberSet<'a> {
        match involved {
            Some(names) if !names.is_empty() => MemberSet::new(names.to_vec()),
            _ => self.registry.members(),
        }
    }
}
