use crate::algebra::BooleanAlgebra;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Clone, PartialEq)]
#[serde(bound = "P: Serialize + DeserializeOwned")]
pub struct SfaMove<P> {
    pub from: usize,
    pub to: usize,
    pub guard: P,
}

#[derive(Serialize, Deserialize, Clone, PartialEq)]
#[serde(bound = "P: Serialize + DeserializeOwned")]
pub struct Sfa<P> {
    pub num_states: usize,
    pub initial: usize,
    pub accepting: Vec<usize>,
    pub moves: Vec<SfaMove<P>>,
}

impl<P: fmt::Display> fmt::Debug for Sfa<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "")?;
        writeln!(f, "states:\t{}", self.num_states)?;
        writeln!(f, "init:\t{}", self.initial)?;
        writeln!(f, "acc:\t{:?}", self.accepting)?;
        for m in &self.moves {
            writeln!(f, "{} -{}-> {}", m.from, m.guard, m.to)?;
        }
        return Ok(());
    }
}

impl<P> Sfa<P> {
    pub fn state_count(&self) -> usize {
        return self.num_states;
    }
    pub fn transition_count(&self) -> usize {
        return self.moves.len();
    }
    pub fn is_accepting(&self, q: usize) -> bool {
        return self.accepting.contains(&q);
    }
    pub fn moves_from(&self, q: usize) -> impl Iterator<Item = &SfaMove<P>> {
        self.moves.iter().filter(move |m| m.from == q)
    }
    pub fn step<B>(&self, q: usize, s: &B::Sym, ba: &B) -> Option<usize>
    where
        B: BooleanAlgebra<Predicate = P>,
    {
        for m in self.moves_from(q) {
            if ba.has_model(&m.guard, s) {
                return Some(m.to);
            }
        }
        return None;
    }
    // sanity checking only, the learner itself never runs words
    pub fn accepts<B, I>(&self, word: I, ba: &B) -> bool
    where
        B: BooleanAlgebra<Predicate = P>,
        I: IntoIterator<Item = B::Sym>,
    {
        let mut q = self.initial;
        for s in word {
            q = match self.step(q, &s, ba) {
                Some(next) => next,
                None => return false,
            };
        }
        return self.is_accepting(q);
    }
}

impl<P: Clone> Sfa<P> {
    pub fn mk_total<B>(mut self, ba: &B) -> Sfa<P>
    where
        B: BooleanAlgebra<Predicate = P>,
    {
        let mut residuals = Vec::new();
        for q in 0..self.num_states {
            let mut covered: Option<P> = None;
            for m in self.moves_from(q) {
                covered = Some(match covered {
                    None => m.guard.clone(),
                    Some(c) => ba.mk_or(&c, &m.guard),
                });
            }
            let residual = match covered {
                None => ba.mk_true(),
                Some(c) => ba.mk_not(&c),
            };
            if ba.is_satisfiable(&residual) {
                residuals.push((q, residual));
            }
        }
        if residuals.is_empty() {
            return self;
        }
        let sink = self.num_states;
        self.num_states += 1;
        for (q, guard) in residuals {
            self.moves.push(SfaMove { from: q, to: sink, guard });
        }
        self.moves.push(SfaMove {
            from: sink,
            to: sink,
            guard: ba.mk_true(),
        });
        return self;
    }
}
