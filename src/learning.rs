use crate::algebra::BooleanAlgebra;
use crate::oracle::{OracleError, SymbolicOracle};
use crate::sfa::{Sfa, SfaMove};
use crate::stopwatch::Stopwatch;
use crate::util::{fmt_word, is_strict_prefix, join_vec};
use crate::Symbol;
use bimap::BiMap;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::fmt;

pub type WordId = usize;

#[derive(Debug, Clone)]
pub enum ObservedPart<A, P> {
    Unresolved(P),
    Resolved { guard: P, target: WordId, witness: A },
}

impl<A, P> ObservedPart<A, P> {
    fn guard(&self) -> &P {
        match self {
            ObservedPart::Unresolved(p) => p,
            ObservedPart::Resolved { guard, .. } => guard,
        }
    }
    fn target(&self) -> Option<WordId> {
        match self {
            ObservedPart::Unresolved(_) => None,
            ObservedPart::Resolved { target, .. } => Some(*target),
        }
    }
    fn is_resolved(&self) -> bool {
        match self {
            ObservedPart::Unresolved(_) => false,
            ObservedPart::Resolved { .. } => true,
        }
    }
}

pub enum LearnError<P> {
    Oracle(OracleError),
    Invariant(&'static str),
    LimitExceeded(Sfa<P>),
}
impl<P> From<OracleError> for LearnError<P> {
    fn from(e: OracleError) -> Self {
        LearnError::Oracle(e)
    }
}
impl<P: fmt::Display> fmt::Debug for LearnError<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearnError::Oracle(e) => write!(f, "Oracle({:?})", e),
            LearnError::Invariant(msg) => write!(f, "Invariant({})", msg),
            LearnError::LimitExceeded(sfa) => write!(f, "LimitExceeded({:?})", sfa),
        }
    }
}
impl<P: fmt::Display> fmt::Display for LearnError<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearnError::Oracle(e) => write!(f, "oracle failure: {}", e),
            LearnError::Invariant(msg) => write!(f, "internal invariant violated: {}", msg),
            LearnError::LimitExceeded(_) => write!(f, "equivalence query limit exceeded"),
        }
    }
}
impl<P: fmt::Display> std::error::Error for LearnError<P> {}

pub struct LearnerConfig {
    pub debug_output: bool,
    pub max_equivalence_queries: Option<usize>,
}
impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            debug_output: false,
            max_equivalence_queries: None,
        }
    }
}

#[derive(Debug)]
pub struct RunStats {
    pub num_conjectures: usize,
    pub conjecture_sizes: Vec<usize>,
    pub counterexamples: Vec<String>,
    pub warnings: Vec<String>,
    pub sw_maintenance: Stopwatch,
    pub sw_construction: Stopwatch,
}
impl RunStats {
    pub fn new() -> Self {
        return RunStats {
            num_conjectures: 0,
            conjecture_sizes: vec![],
            counterexamples: vec![],
            warnings: vec![],
            sw_maintenance: Stopwatch::new(),
            sw_construction: Stopwatch::new(),
        };
    }
    pub fn stop_all(&mut self) {
        self.sw_maintenance.stop();
        self.sw_construction.stop();
    }
}

pub struct ObsTable<A: Symbol, P> {
    pub words: BiMap<Vec<A>, WordId>,
    pub s: Vec<WordId>,
    pub r: Vec<WordId>,
    pub sur: Vec<WordId>,
    pub e: Vec<Vec<A>>,
    pub f: HashMap<WordId, bool>,
    pub partitions: HashMap<WordId, Vec<ObservedPart<A, P>>>,
    pub arb: A,
}

impl<A: Symbol, P> ObsTable<A, P> {
    fn intern(&mut self, w: Vec<A>) -> WordId {
        if let Some(id) = self.words.get_by_left(&w) {
            return *id;
        }
        let id = self.words.len();
        self.words.insert_no_overwrite(w, id).unwrap();
        return id;
    }
    fn word(&self, id: WordId) -> &Vec<A> {
        return self.words.get_by_right(&id).unwrap();
    }
    fn lookup(&self, w: &Vec<A>) -> Option<WordId> {
        return self.words.get_by_left(w).cloned();
    }
    // None while some entry of the row has not been filled yet
    fn row(&self, id: WordId) -> Option<Vec<bool>> {
        let w = self.word(id);
        let mut ret = Vec::with_capacity(self.e.len());
        for e in &self.e {
            let we = join_vec(w, e);
            match self.lookup(&we).and_then(|wid| self.f.get(&wid)) {
                Some(b) => ret.push(*b),
                None => return None,
            }
        }
        return Some(ret);
    }
    // row with every column equal to skip left out
    fn row_without(&self, id: WordId, skip: &Vec<A>) -> Option<Vec<bool>> {
        let w = self.word(id);
        let mut ret = Vec::new();
        for e in &self.e {
            if e == skip {
                continue;
            }
            let we = join_vec(w, e);
            match self.lookup(&we).and_then(|wid| self.f.get(&wid)) {
                Some(b) => ret.push(*b),
                None => return None,
            }
        }
        return Some(ret);
    }
    fn row_required(&self, id: WordId) -> Result<Vec<bool>, LearnError<P>> {
        return self
            .row(id)
            .ok_or(LearnError::Invariant("a row entry is missing where one was assumed present"));
    }
    fn state_rows(&self) -> Result<HashMap<Vec<bool>, WordId>, LearnError<P>> {
        let mut m = HashMap::new();
        for &sid in &self.s {
            m.insert(self.row_required(sid)?, sid);
        }
        return Ok(m);
    }
}

impl<A: Symbol, P: Clone> ObsTable<A, P> {
    pub fn new<B>(ba: &B, arb: A) -> Self
    where
        B: BooleanAlgebra<Sym = A, Predicate = P>,
    {
        let mut words = BiMap::new();
        words.insert_no_overwrite(vec![], 0).unwrap();
        let mut table = ObsTable {
            words,
            s: vec![0],
            r: vec![],
            sur: vec![0],
            e: vec![vec![]],
            f: HashMap::new(),
            partitions: HashMap::new(),
            arb,
        };
        let first = table.intern(vec![arb]);
        table.r.push(first);
        table.sur.push(first);
        table.partitions.insert(0, vec![ObservedPart::Unresolved(ba.mk_true())]);
        return table;
    }

    pub fn fill<O>(&mut self, o: &mut O) -> Result<(), LearnError<P>>
    where
        O: SymbolicOracle<A, P>,
    {
        let sur = self.sur.clone();
        let evidence = self.e.clone();
        for wid in sur {
            let w = self.word(wid).clone();
            for e in &evidence {
                let we = join_vec(&w, e);
                let id = self.intern(we.clone());
                if !self.f.contains_key(&id) {
                    let acc = o.check_membership(&we)?;
                    self.f.insert(id, acc);
                }
            }
        }
        return Ok(());
    }

    fn add_state<B, O>(&mut self, ba: &B, o: &mut O, id: WordId) -> Result<(), LearnError<P>>
    where
        B: BooleanAlgebra<Sym = A, Predicate = P>,
        O: SymbolicOracle<A, P>,
    {
        let w = self.word(id).clone();
        if !w.is_empty() {
            let pref = w[0..w.len() - 1].to_vec();
            let prefix_is_state = self.lookup(&pref).map_or(false, |pid| self.s.contains(&pid));
            if !prefix_is_state {
                return Err(LearnError::Invariant(
                    "promoted word's immediate prefix is not an access string",
                ));
            }
        }
        self.s.push(id);
        if !self.sur.contains(&id) {
            self.sur.push(id);
        }
        self.r.retain(|&x| x != id);
        let acc = o.check_membership(&w)?;
        self.f.insert(id, acc);
        // partitions are rebuilt from scratch after every promotion
        self.partitions.clear();
        for &sid in &self.s {
            self.partitions
                .insert(sid, vec![ObservedPart::Unresolved(ba.mk_true())]);
        }
        return Ok(());
    }

    pub fn close<B, O>(&mut self, ba: &B, o: &mut O) -> Result<bool, LearnError<P>>
    where
        B: BooleanAlgebra<Sym = A, Predicate = P>,
        O: SymbolicOracle<A, P>,
    {
        let mut sigs = HashSet::new();
        for &sid in &self.s {
            sigs.insert(self.row_required(sid)?);
        }
        let mut best: Option<WordId> = None;
        for &rid in &self.r {
            let row = self.row_required(rid)?;
            if sigs.contains(&row) {
                continue;
            }
            // promote the shortest frontier word with this row
            let mut best_r = rid;
            for &rp in &self.r {
                if self.row_required(rp)? != row {
                    continue;
                }
                if self.word(rp).len() < self.word(best_r).len() {
                    best_r = rp;
                }
            }
            best = Some(best_r);
            break;
        }
        let rid = match best {
            None => return Ok(false),
            Some(x) => x,
        };
        self.add_state(ba, o, rid)?;
        // evidence closure
        let r_word = self.word(rid).clone();
        for e in self.e.clone() {
            let re = join_vec(&r_word, &e);
            let id = self.intern(re);
            if !self.sur.contains(&id) {
                self.r.push(id);
                self.sur.push(id);
            }
        }
        // the evidence may all be longer than one symbol, so make sure the
        // new state has a one-symbol continuation in the table
        let mut cont = false;
        for &wid in &self.sur {
            let w = self.word(wid);
            if w.len() == r_word.len() + 1 && is_strict_prefix(&r_word, w) {
                cont = true;
                break;
            }
        }
        if !cont {
            let ra = join_vec(&r_word, &vec![self.arb]);
            let id = self.intern(ra);
            if !self.sur.contains(&id) {
                self.r.push(id);
                self.sur.push(id);
            }
        }
        return Ok(true);
    }

    pub fn make_consistent(&mut self) -> Result<bool, LearnError<P>> {
        let n = self.sur.len();
        for (i, j) in (0..n).tuple_combinations::<(usize, usize)>() {
            let w1 = self.sur[i];
            let w2 = self.sur[j];
            if self.row_required(w1)? != self.row_required(w2)? {
                continue;
            }
            let cont1: Vec<WordId> = self
                .sur
                .iter()
                .cloned()
                .filter(|&wa| is_strict_prefix(self.word(w1), self.word(wa)))
                .collect();
            let cont2: Vec<WordId> = self
                .sur
                .iter()
                .cloned()
                .filter(|&wa| is_strict_prefix(self.word(w2), self.word(wa)))
                .collect();
            for &w1a in &cont1 {
                let suffix1 = self.word(w1a)[self.word(w1).len()..].to_vec();
                for &w2a in &cont2 {
                    if self.word(w2a)[self.word(w2).len()..] != suffix1[..] {
                        continue;
                    }
                    let r1 = self.row_required(w1a)?;
                    let r2 = self.row_required(w2a)?;
                    if r1 == r2 {
                        continue;
                    }
                    // row(w1) == row(w2) but row(w1·v) != row(w2·v);
                    // the first disagreeing column locates the evidence to extend
                    let mut new_e = suffix1.clone();
                    for k in 0..self.e.len() {
                        if r1[k] != r2[k] {
                            new_e.extend_from_slice(&self.e[k]);
                            break;
                        }
                    }
                    self.e.push(new_e.clone());
                    // evidence closure over the access strings
                    for sid in self.s.clone() {
                        let sw = self.word(sid).clone();
                        let se = join_vec(&sw, &new_e);
                        let id = self.intern(se);
                        if !self.sur.contains(&id) {
                            self.r.push(id);
                            self.sur.push(id);
                        }
                    }
                    return Ok(true);
                }
            }
        }
        return Ok(false);
    }

    // called only right after make_consistent appended new evidence
    pub fn distribute(&mut self) -> Result<bool, LearnError<P>> {
        let newest = match self.e.last() {
            Some(e) => e.clone(),
            None => return Ok(false),
        };
        let mut to_add: Vec<Vec<A>> = Vec::new();
        let n = self.sur.len();
        for (i, j) in (0..n).tuple_combinations::<(usize, usize)>() {
            let u1 = self.sur[i];
            let u2 = self.sur[j];
            let ru1 = match self.row_without(u1, &newest) {
                Some(x) => x,
                None => {
                    return Err(LearnError::Invariant(
                        "a row entry is missing where one was assumed present",
                    ))
                }
            };
            let ru2 = match self.row_without(u2, &newest) {
                Some(x) => x,
                None => {
                    return Err(LearnError::Invariant(
                        "a row entry is missing where one was assumed present",
                    ))
                }
            };
            if ru1 != ru2 {
                continue;
            }
            let u1e = join_vec(self.word(u1), &newest);
            let u2e = join_vec(self.word(u2), &newest);
            let f1 = self.lookup(&u1e).and_then(|id| self.f.get(&id).cloned());
            let f2 = self.lookup(&u2e).and_then(|id| self.f.get(&id).cloned());
            let (f1, f2) = match (f1, f2) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(LearnError::Invariant(
                        "a row entry is missing where one was assumed present",
                    ))
                }
            };
            if f1 == f2 {
                continue;
            }
            // rows agreed until the new evidence told u1 and u2 apart, so their
            // single-symbol continuations have to be comparable on both sides
            for &unb in &self.sur {
                for &(ua, ub) in &[(u1, u2), (u2, u1)] {
                    if self.word(unb).len() != self.word(ua).len() + 1 {
                        continue;
                    }
                    if !is_strict_prefix(self.word(ua), self.word(unb)) {
                        continue;
                    }
                    let b = vec![*self.word(unb).last().unwrap()];
                    let mut add_flag = true;
                    for &w in &self.sur {
                        if self.row_required(w)? != self.row_required(ub)? {
                            continue;
                        }
                        let wb = join_vec(self.word(w), &b);
                        let present = self.lookup(&wb).map_or(false, |id| self.sur.contains(&id));
                        if present || to_add.contains(&wb) {
                            add_flag = false;
                            break;
                        }
                    }
                    if add_flag {
                        let ubb = join_vec(self.word(ub), &b);
                        let present = self.lookup(&ubb).map_or(false, |id| self.sur.contains(&id));
                        if !present && !to_add.contains(&ubb) {
                            to_add.push(ubb);
                        }
                    }
                }
            }
        }
        let changed = !to_add.is_empty();
        for w in to_add {
            let id = self.intern(w);
            if !self.sur.contains(&id) {
                self.r.push(id);
                self.sur.push(id);
            }
        }
        return Ok(changed);
    }

    pub fn complete_partitions<B, O>(&mut self, ba: &B, o: &mut O) -> Result<bool, LearnError<P>>
    where
        B: BooleanAlgebra<Sym = A, Predicate = P>,
        O: SymbolicOracle<A, P>,
    {
        let states = self.state_rows()?;
        let mut resolved_any = false;
        for sid in self.s.clone() {
            let parts = match self.partitions.get(&sid) {
                Some(p) => p.clone(),
                None => {
                    return Err(LearnError::Invariant(
                        "partition bookkeeping is missing for an access string",
                    ))
                }
            };
            for (idx, part) in parts.iter().enumerate() {
                let p = match part {
                    ObservedPart::Unresolved(p) => p.clone(),
                    ObservedPart::Resolved { .. } => continue,
                };
                let wit = match ba.generate_witness(&p) {
                    Some(w) => w,
                    None => {
                        return Err(LearnError::Invariant(
                            "unsatisfiable predicate in an observed partition",
                        ))
                    }
                };
                let sw = self.word(sid).clone();
                let ext = join_vec(&sw, &vec![wit]);
                let ext_id = self.intern(ext);
                match self.row(ext_id) {
                    // the row cannot be computed yet: put the extension on the
                    // frontier and let the caller fill and retry
                    None => {
                        if !self.sur.contains(&ext_id) {
                            self.r.push(ext_id);
                            self.sur.push(ext_id);
                        }
                        return Ok(true);
                    }
                    Some(row) => match states.get(&row) {
                        None => {
                            self.add_state(ba, o, ext_id)?;
                            self.e.push(vec![wit]);
                            return Ok(true);
                        }
                        Some(&target) => {
                            if let Some(parts_mut) = self.partitions.get_mut(&sid) {
                                parts_mut[idx] = ObservedPart::Resolved {
                                    guard: p,
                                    target,
                                    witness: wit,
                                };
                            }
                            resolved_any = true;
                        }
                    },
                }
            }
        }
        return Ok(resolved_any);
    }

    pub fn process<B>(&mut self, ba: &B, cx: &Vec<P>) -> Result<(), LearnError<P>>
    where
        B: BooleanAlgebra<Sym = A, Predicate = P>,
    {
        let mut current = match self.s.first() {
            Some(&sid) => sid,
            None => return Err(LearnError::Invariant("the access string set is empty")),
        };
        let mut changed = false;
        for pred in cx {
            let mut cur_pred = pred.clone();
            let parts = match self.partitions.get(&current) {
                Some(p) => p.clone(),
                None => {
                    return Err(LearnError::Invariant(
                        "partition bookkeeping is missing for an access string",
                    ))
                }
            };
            let mut new_parts: Vec<ObservedPart<A, P>> = Vec::with_capacity(parts.len() + 1);
            let mut found_overlap = false;
            let mut exact = false;
            let mut next_state: Option<WordId> = None;
            for part in parts {
                if exact {
                    new_parts.push(part);
                    continue;
                }
                let guard = part.guard().clone();
                if ba.are_equivalent(&guard, &cur_pred) {
                    found_overlap = true;
                    exact = true;
                    next_state = part.target();
                    new_parts.push(part);
                    continue;
                }
                let inside = ba.mk_and(&guard, &cur_pred);
                if ba.is_satisfiable(&inside) {
                    // split the overlapping piece off this triple, and shrink the
                    // counterexample predicate by the part already matched
                    found_overlap = true;
                    changed = true;
                    let outside = ba.mk_and(&guard, &ba.mk_not(&cur_pred));
                    new_parts.push(ObservedPart::Unresolved(inside));
                    if ba.is_satisfiable(&outside) {
                        new_parts.push(ObservedPart::Unresolved(outside));
                    }
                    cur_pred = ba.mk_and(&cur_pred, &ba.mk_not(&guard));
                } else {
                    new_parts.push(part);
                }
            }
            self.partitions.insert(current, new_parts);
            if !found_overlap {
                return Err(LearnError::Invariant(
                    "observed partition does not intersect the counterexample",
                ));
            }
            if changed {
                break;
            }
            current = match next_state {
                Some(t) => t,
                None => {
                    return Err(LearnError::Invariant(
                        "unresolved partition entry while walking a counterexample",
                    ))
                }
            };
        }
        if !changed {
            return Err(LearnError::Invariant("counterexample produced no refinement"));
        }
        // every suffix of the counterexample becomes evidence, longest first
        let mut wits = Vec::with_capacity(cx.len());
        for pred in cx {
            match ba.generate_witness(pred) {
                Some(w) => wits.push(w),
                None => {
                    return Err(LearnError::Invariant(
                        "counterexample contains an unsatisfiable predicate",
                    ))
                }
            }
        }
        for i in 0..wits.len() {
            self.e.push(wits[i..].to_vec());
        }
        return Ok(());
    }

    // requires a closed, consistent table with fully resolved partitions
    pub fn build_sfa<B>(&self, ba: &B) -> Result<Sfa<P>, LearnError<P>>
    where
        B: BooleanAlgebra<Sym = A, Predicate = P>,
    {
        let states = self.state_rows()?;
        for &wid in &self.sur {
            let row = self.row_required(wid)?;
            if !states.contains_key(&row) {
                return Err(LearnError::Invariant("table is not closed at automaton construction"));
            }
        }
        let mut moves = Vec::new();
        for (i, &sid) in self.s.iter().enumerate() {
            let parts = match self.partitions.get(&sid) {
                Some(p) => p,
                None => {
                    return Err(LearnError::Invariant(
                        "partition bookkeeping is missing for an access string",
                    ))
                }
            };
            // one guarded move per distinct target state
            let mut grouped: Vec<(WordId, P)> = Vec::new();
            for part in parts {
                match part {
                    ObservedPart::Unresolved(_) => {
                        return Err(LearnError::Invariant(
                            "partition is incomplete at automaton construction",
                        ))
                    }
                    ObservedPart::Resolved { guard, target, .. } => {
                        match grouped.iter_mut().find(|(t, _)| *t == *target) {
                            Some((_, g)) => *g = ba.mk_or(g, guard),
                            None => grouped.push((*target, guard.clone())),
                        }
                    }
                }
            }
            for (target, guard) in grouped {
                let to = match self.s.iter().position(|&x| x == target) {
                    Some(j) => j,
                    None => {
                        return Err(LearnError::Invariant("transition target is not an access string"))
                    }
                };
                moves.push(SfaMove { from: i, to, guard });
            }
        }
        let mut accepting = Vec::new();
        for (i, &sid) in self.s.iter().enumerate() {
            match self.f.get(&sid) {
                Some(true) => accepting.push(i),
                Some(false) => {}
                None => {
                    return Err(LearnError::Invariant("membership is missing for an access string"))
                }
            }
        }
        let initial = match self.s.iter().position(|&sid| self.word(sid).is_empty()) {
            Some(0) => 0,
            _ => return Err(LearnError::Invariant("the empty access string is not state zero")),
        };
        return Ok(Sfa {
            num_states: self.s.len(),
            initial,
            accepting,
            moves,
        });
    }
}

impl<A: Symbol, P> fmt::Display for ObsTable<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |f: &mut fmt::Formatter<'_>, table: &Self, w: &Vec<A>| -> fmt::Result {
            for e in &table.e {
                let we = join_vec(w, e);
                match table.lookup(&we).and_then(|id| table.f.get(&id)) {
                    Some(true) => write!(f, " +")?,
                    Some(false) => write!(f, " -")?,
                    None => write!(f, "  ")?,
                }
            }
            return Ok(());
        };
        write!(f, "E:")?;
        for e in &self.e {
            write!(f, " {}", fmt_word(e))?;
        }
        writeln!(f, "")?;
        writeln!(f, "S:")?;
        for &sid in &self.s {
            write!(f, " {} :", fmt_word(self.word(sid)))?;
            cell(f, self, self.word(sid))?;
            writeln!(f, "")?;
        }
        writeln!(f, "R:")?;
        for &rid in &self.r {
            write!(f, " {} :", fmt_word(self.word(rid)))?;
            cell(f, self, self.word(rid))?;
            writeln!(f, "")?;
        }
        return Ok(());
    }
}

fn run_maintenance<B, O>(
    table: &mut ObsTable<B::Sym, B::Predicate>,
    ba: &B,
    o: &mut O,
) -> Result<(), LearnError<B::Predicate>>
where
    B: BooleanAlgebra,
    O: SymbolicOracle<B::Sym, B::Predicate>,
{
    table.fill(o)?;
    let mut consflag = true;
    let mut closeflag = true;
    loop {
        // make_consistent can grow E, so refill and recheck closedness
        if consflag {
            consflag = table.make_consistent()?;
        }
        if consflag {
            table.fill(o)?;
            if table.distribute()? {
                table.fill(o)?;
            }
            closeflag = true;
        }
        // close can grow R, so refill and recheck consistency
        if closeflag {
            closeflag = table.close(ba, o)?;
        }
        if closeflag {
            table.fill(o)?;
            consflag = true;
        }
        consflag = table.complete_partitions(ba, o)? || consflag;
        table.fill(o)?;
        if !consflag && !closeflag {
            break;
        }
    }
    return Ok(());
}

pub fn learn<B, O>(
    o: &mut O,
    ba: &B,
    opt: &LearnerConfig,
) -> Result<(Sfa<B::Predicate>, RunStats), LearnError<B::Predicate>>
where
    B: BooleanAlgebra,
    O: SymbolicOracle<B::Sym, B::Predicate>,
{
    let arb = match ba.generate_witness(&ba.mk_true()) {
        Some(w) => w,
        None => return Err(LearnError::Invariant("the true predicate has no witness")),
    };
    let mut table = ObsTable::new(ba, arb);
    let mut stats = RunStats::new();
    let mut cnt = 0;
    loop {
        stats.sw_maintenance.start();
        run_maintenance(&mut table, ba, o)?;
        stats.sw_maintenance.stop();
        if opt.debug_output {
            println!("{}", table);
        }
        stats.sw_construction.start();
        let conjecture = table.build_sfa(ba)?.mk_total(ba);
        stats.sw_construction.stop();
        stats.num_conjectures += 1;
        stats.conjecture_sizes.push(conjecture.state_count());
        if opt.debug_output {
            println!("conjecture: {:?}", conjecture);
        }
        match o.check_equivalence(&conjecture)? {
            None => {
                stats.stop_all();
                return Ok((conjecture, stats));
            }
            Some(cx) => {
                if opt.debug_output {
                    println!("counterexample: {:?}", cx);
                }
                cnt += 1;
                if let Some(limit) = opt.max_equivalence_queries {
                    if cnt >= limit {
                        stats.stop_all();
                        return Err(LearnError::LimitExceeded(conjecture));
                    }
                }
                let repr = format!("{:?}", cx);
                if stats.counterexamples.contains(&repr) {
                    stats.warnings.push(format!("a counterexample was returned twice: {}", repr));
                }
                stats.counterexamples.push(repr);
                table.process(ba, &cx)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval_algebra::{IntervalAlgebra, IntervalPred};
    use crate::oracle::SfaOracle;
    use crate::util::find_diff_langs;
    use rand::SeedableRng;
    use std::time::Duration;

    type CharAlg = IntervalAlgebra<char>;
    type CharPred = IntervalPred<char>;

    fn word(s: &str) -> Vec<char> {
        return s.chars().collect();
    }

    // two states: everything before the first 'a' loops, one 'a' is absorbing
    fn contains_a_sfa() -> Sfa<CharPred> {
        let ba = CharAlg::new();
        let a = IntervalPred::singleton('a');
        Sfa {
            num_states: 2,
            initial: 0,
            accepting: vec![1],
            moves: vec![
                SfaMove { from: 0, to: 1, guard: a.clone() },
                SfaMove { from: 0, to: 0, guard: ba.mk_not(&a) },
                SfaMove { from: 1, to: 1, guard: ba.mk_true() },
            ],
        }
    }
    fn empty_lang_sfa() -> Sfa<CharPred> {
        Sfa {
            num_states: 1,
            initial: 0,
            accepting: vec![],
            moves: vec![SfaMove { from: 0, to: 0, guard: IntervalPred::full() }],
        }
    }
    // three states keyed on the first symbol: [a-m] accepts everything after,
    // anything else rejects everything after
    fn first_in_am_sfa() -> Sfa<CharPred> {
        let ba = CharAlg::new();
        let am = IntervalPred::range('a', 'm');
        Sfa {
            num_states: 3,
            initial: 0,
            accepting: vec![1],
            moves: vec![
                SfaMove { from: 0, to: 1, guard: am.clone() },
                SfaMove { from: 0, to: 2, guard: ba.mk_not(&am) },
                SfaMove { from: 1, to: 1, guard: ba.mk_true() },
                SfaMove { from: 2, to: 2, guard: ba.mk_true() },
            ],
        }
    }
    // three states recognizing words that contain "ab"
    fn contains_ab_sfa() -> Sfa<CharPred> {
        let ba = CharAlg::new();
        let a = IntervalPred::singleton('a');
        let b = IntervalPred::singleton('b');
        let other = ba.mk_not(&ba.mk_or(&a, &b));
        Sfa {
            num_states: 3,
            initial: 0,
            accepting: vec![2],
            moves: vec![
                SfaMove { from: 0, to: 1, guard: a.clone() },
                SfaMove { from: 0, to: 0, guard: ba.mk_not(&a) },
                SfaMove { from: 1, to: 1, guard: a.clone() },
                SfaMove { from: 1, to: 2, guard: b.clone() },
                SfaMove { from: 1, to: 0, guard: other },
                SfaMove { from: 2, to: 2, guard: ba.mk_true() },
            ],
        }
    }
    fn oracle_for(target: Sfa<CharPred>) -> SfaOracle<CharAlg> {
        return SfaOracle::new(target, CharAlg::new());
    }

    #[test]
    fn learn_contains_a() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_a_sfa());
        let (learned, _stats) = learn(&mut o, &ba, &LearnerConfig::default()).unwrap();
        assert_eq!(learned.state_count(), 2);
        assert_eq!(learned.transition_count(), 3);
        // regression baseline on equivalence queries (includes the confirming one)
        assert!(o.num_equivalence() <= 3);
        assert!(learned.accepts("a".chars(), &ba));
        assert!(learned.accepts("zza".chars(), &ba));
        assert!(learned.accepts("azz".chars(), &ba));
        assert!(!learned.accepts("".chars(), &ba));
        assert!(!learned.accepts("xyz".chars(), &ba));
        let mut check = oracle_for(contains_a_sfa());
        assert_eq!(check.check_equivalence(&learned).unwrap(), None);
    }
    #[test]
    fn learn_empty_language() {
        let ba = CharAlg::new();
        let mut o = oracle_for(empty_lang_sfa());
        let (learned, stats) = learn(&mut o, &ba, &LearnerConfig::default()).unwrap();
        assert_eq!(learned.state_count(), 1);
        assert!(learned.accepting.is_empty());
        assert_eq!(learned.transition_count(), 1);
        assert!(ba.are_equivalent(&learned.moves[0].guard, &ba.mk_true()));
        assert_eq!(o.num_equivalence(), 1);
        assert_eq!(stats.num_conjectures, 1);
        assert!(!learned.accepts("anything".chars(), &ba));
    }
    #[test]
    fn learn_first_symbol_interval() {
        let ba = CharAlg::new();
        let mut o = oracle_for(first_in_am_sfa());
        let (learned, _stats) = learn(&mut o, &ba, &LearnerConfig::default()).unwrap();
        assert_eq!(learned.state_count(), 3);
        assert!(o.num_equivalence() <= 6);
        assert!(learned.accepts("m".chars(), &ba));
        assert!(learned.accepts("cxyz".chars(), &ba));
        assert!(!learned.accepts("".chars(), &ba));
        assert!(!learned.accepts("za".chars(), &ba));
        let mut check = oracle_for(first_in_am_sfa());
        assert_eq!(check.check_equivalence(&learned).unwrap(), None);
    }
    #[test]
    fn learn_contains_ab() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_ab_sfa());
        let (learned, _stats) = learn(&mut o, &ba, &LearnerConfig::default()).unwrap();
        assert_eq!(learned.state_count(), 3);
        let mut check = oracle_for(contains_ab_sfa());
        assert_eq!(check.check_equivalence(&learned).unwrap(), None);
        // independent randomized confirmation
        let target = contains_ab_sfa();
        let ba2 = CharAlg::new();
        let memq = |w: &Vec<char>| target.accepts(w.iter().cloned(), &ba2);
        let ba3 = CharAlg::new();
        let learned_ref = &learned;
        let hypq = move |w: &Vec<char>| learned_ref.accepts(w.iter().cloned(), &ba3);
        let mut rng = rand::rngs::SmallRng::seed_from_u64(42);
        let alph = vec!['a', 'b', 'c'];
        assert_eq!(find_diff_langs(&memq, &hypq, &alph, 500, 8, &mut rng), None);
    }
    #[test]
    fn learn_over_integer_domain() {
        let ba = IntervalAlgebra::<u8>::new();
        let high = IntervalPred::range(128u8, 255u8);
        let target = Sfa {
            num_states: 3,
            initial: 0,
            accepting: vec![1],
            moves: vec![
                SfaMove { from: 0, to: 1, guard: high.clone() },
                SfaMove { from: 0, to: 2, guard: ba.mk_not(&high) },
                SfaMove { from: 1, to: 1, guard: ba.mk_true() },
                SfaMove { from: 2, to: 2, guard: ba.mk_true() },
            ],
        };
        let mut o = SfaOracle::new(target.clone(), ba.clone());
        let (learned, _stats) = learn(&mut o, &ba, &LearnerConfig::default()).unwrap();
        assert_eq!(learned.state_count(), 3);
        assert!(learned.accepts(vec![200u8, 5u8], &ba));
        assert!(!learned.accepts(vec![5u8, 200u8], &ba));
        let mut check = SfaOracle::new(target, ba.clone());
        assert_eq!(check.check_equivalence(&learned).unwrap(), None);
    }
    #[test]
    fn membership_is_memoized() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_a_sfa());
        let mut table: ObsTable<char, CharPred> = ObsTable::new(&ba, '\u{0}');
        table.fill(&mut o).unwrap();
        let n = o.num_membership();
        assert!(n > 0);
        table.fill(&mut o).unwrap();
        assert_eq!(o.num_membership(), n);
    }
    #[test]
    fn close_postcondition() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_a_sfa());
        let mut table: ObsTable<char, CharPred> = ObsTable::new(&ba, '\u{0}');
        for w in &["b", "a", "ba"] {
            let id = table.intern(word(w));
            table.r.push(id);
            table.sur.push(id);
        }
        let mut promoted = 0;
        loop {
            table.fill(&mut o).unwrap();
            if !table.close(&ba, &mut o).unwrap() {
                break;
            }
            promoted += 1;
        }
        assert_eq!(promoted, 1);
        // the shortest member of the unclosed row class was promoted
        assert!(table.s.iter().any(|&sid| table.word(sid) == &word("a")));
        table.fill(&mut o).unwrap();
        let sigs: Vec<Vec<bool>> = table.s.iter().map(|&sid| table.row(sid).unwrap()).collect();
        for &rid in &table.r {
            assert!(sigs.contains(&table.row(rid).unwrap()));
        }
    }
    #[test]
    fn make_consistent_and_distribute() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_ab_sfa());
        let mut table: ObsTable<char, CharPred> = ObsTable::new(&ba, '\u{0}');
        for w in &["a", "b", "ab"] {
            let id = table.intern(word(w));
            table.r.push(id);
            table.sur.push(id);
        }
        table.fill(&mut o).unwrap();
        // ε and "a" share a row but disagree after the common suffix "b"
        assert!(table.make_consistent().unwrap());
        assert!(table.e.contains(&word("b")));
        table.fill(&mut o).unwrap();
        assert!(table.distribute().unwrap());
        let aa = table.lookup(&word("aa")).unwrap();
        assert!(table.sur.contains(&aa));
        // drive consistency to its fixpoint and check the postcondition
        loop {
            table.fill(&mut o).unwrap();
            if !table.make_consistent().unwrap() {
                break;
            }
            table.fill(&mut o).unwrap();
            table.distribute().unwrap();
        }
        table.fill(&mut o).unwrap();
        let sur = table.sur.clone();
        for &w1 in &sur {
            for &w2 in &sur {
                if w1 == w2 || table.row(w1) != table.row(w2) {
                    continue;
                }
                for &w1a in &sur {
                    for &w2a in &sur {
                        let ok = table.word(w1a).len() == table.word(w1).len() + 1
                            && table.word(w2a).len() == table.word(w2).len() + 1
                            && is_strict_prefix(table.word(w1), table.word(w1a))
                            && is_strict_prefix(table.word(w2), table.word(w2a))
                            && table.word(w1a).last() == table.word(w2a).last();
                        if ok {
                            assert_eq!(table.row(w1a), table.row(w2a));
                        }
                    }
                }
            }
        }
    }
    #[test]
    fn partition_totality() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_a_sfa());
        let mut table: ObsTable<char, CharPred> = ObsTable::new(&ba, '\u{0}');
        run_maintenance(&mut table, &ba, &mut o).unwrap();
        for &sid in &table.s {
            let parts = table.partitions.get(&sid).unwrap();
            assert!(parts.iter().all(|p| p.is_resolved()));
            let mut union = IntervalPred::none();
            for p in parts {
                union = ba.mk_or(&union, p.guard());
            }
            assert!(ba.are_equivalent(&union, &ba.mk_true()));
            for (i, p) in parts.iter().enumerate() {
                for q in parts.iter().skip(i + 1) {
                    assert!(!ba.is_satisfiable(&ba.mk_and(p.guard(), q.guard())));
                }
            }
        }
    }
    #[test]
    fn counterexample_grows_evidence() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_a_sfa());
        let mut table: ObsTable<char, CharPred> = ObsTable::new(&ba, '\u{0}');
        run_maintenance(&mut table, &ba, &mut o).unwrap();
        let conjecture = table.build_sfa(&ba).unwrap().mk_total(&ba);
        let cx = o.check_equivalence(&conjecture).unwrap().unwrap();
        let evidence_before = table.e.len();
        let parts_before = table.partitions.get(&table.s[0]).unwrap().len();
        table.process(&ba, &cx).unwrap();
        assert!(table.e.len() > evidence_before);
        assert!(table.partitions.get(&table.s[0]).unwrap().len() > parts_before);
    }
    #[test]
    fn equivalence_query_limit() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_a_sfa());
        let opt = LearnerConfig {
            max_equivalence_queries: Some(1),
            ..Default::default()
        };
        match learn(&mut o, &ba, &opt) {
            Err(LearnError::LimitExceeded(partial)) => {
                assert!(partial.state_count() >= 1);
            }
            _ => panic!(),
        }
    }
    #[test]
    fn oracle_timeout_propagates() {
        let ba = CharAlg::new();
        let mut o = oracle_for(contains_a_sfa()).with_timeout(Duration::new(0, 0));
        std::thread::sleep(Duration::from_millis(2));
        match learn(&mut o, &ba, &LearnerConfig::default()) {
            Err(LearnError::Oracle(OracleError::TimedOut)) => {}
            _ => panic!(),
        }
    }
}
