use crate::Symbol;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait BooleanAlgebra {
    type Predicate: Clone
        + std::cmp::PartialEq
        + std::fmt::Debug
        + std::fmt::Display
        + Serialize
        + DeserializeOwned
        + std::marker::Send;
    type Sym: Symbol;
    fn mk_true(&self) -> Self::Predicate;
    fn mk_and(&self, p: &Self::Predicate, q: &Self::Predicate) -> Self::Predicate;
    fn mk_or(&self, p: &Self::Predicate, q: &Self::Predicate) -> Self::Predicate;
    fn mk_not(&self, p: &Self::Predicate) -> Self::Predicate;
    fn is_satisfiable(&self, p: &Self::Predicate) -> bool;
    fn are_equivalent(&self, p: &Self::Predicate, q: &Self::Predicate) -> bool {
        !self.is_satisfiable(&self.mk_and(p, &self.mk_not(q)))
            && !self.is_satisfiable(&self.mk_and(q, &self.mk_not(p)))
    }
    fn has_model(&self, p: &Self::Predicate, s: &Self::Sym) -> bool;
    // None iff p is unsatisfiable
    fn generate_witness(&self, p: &Self::Predicate) -> Option<Self::Sym>;
}
