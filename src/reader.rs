use crate::interval_algebra::IntervalPred;
use crate::sfa::{Sfa, SfaMove};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::prelude::*;
#[derive(Debug)]
pub enum SfaReadingError {
    IOError(String),
    SerdeError(String),
    BadInitialState(usize),
    BadStateIndex(usize),
    EmptyRange(char, char),
}
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RawMove {
    pub from: usize,
    pub to: usize,
    pub ranges: Vec<(char, char)>,
}
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RawSfa {
    pub states: usize,
    pub initial: usize,
    pub accepting: Vec<usize>,
    pub moves: Vec<RawMove>,
}
pub fn convert_into_proper_sfa(raw: &RawSfa) -> Sfa<IntervalPred<char>> {
    let sfa = Sfa {
        num_states: raw.states,
        initial: raw.initial,
        accepting: raw.accepting.clone(),
        moves: raw
            .moves
            .iter()
            .map(|m| SfaMove {
                from: m.from,
                to: m.to,
                guard: IntervalPred::new(m.ranges.clone()),
            })
            .collect(),
    };
    return sfa;
}
fn parse_as_raw_sfa(cont: &str) -> Result<RawSfa, SfaReadingError> {
    let parsed: serde_json::Result<RawSfa> = serde_json::from_str(cont);
    match &parsed {
        Ok(raw) => {
            if raw.initial >= raw.states {
                return Err(SfaReadingError::BadInitialState(raw.initial));
            }
            for q in raw.accepting.iter() {
                if *q >= raw.states {
                    return Err(SfaReadingError::BadStateIndex(*q));
                }
            }
            for m in raw.moves.iter() {
                if m.from >= raw.states {
                    return Err(SfaReadingError::BadStateIndex(m.from));
                }
                if m.to >= raw.states {
                    return Err(SfaReadingError::BadStateIndex(m.to));
                }
                for (lo, hi) in m.ranges.iter() {
                    if lo > hi {
                        return Err(SfaReadingError::EmptyRange(*lo, *hi));
                    }
                }
            }
            return Ok(raw.clone());
        }
        Err(e) => {
            let x = e.to_string();
            return Err(SfaReadingError::SerdeError(x));
        }
    }
}
pub fn read_file_as_sfa(path: &str) -> Result<RawSfa, SfaReadingError> {
    match &mut File::open(path) {
        Err(e) => return Err(SfaReadingError::IOError(e.to_string())),
        Ok(f) => {
            let mut cont = String::new();
            let res = f.read_to_string(&mut cont);
            match res {
                Err(e) => return Err(SfaReadingError::IOError(e.to_string())),
                Ok(_size) => {
                    return parse_as_raw_sfa(&cont);
                }
            }
        }
    }
}
pub fn read_file_as_words(path: &str) -> Result<Vec<Vec<char>>, SfaReadingError> {
    match &mut File::open(path) {
        Err(e) => return Err(SfaReadingError::IOError(e.to_string())),
        Ok(f) => {
            let mut contents = String::new();
            let res = f.read_to_string(&mut contents);
            match res {
                Err(e) => return Err(SfaReadingError::IOError(e.to_string())),
                Ok(_size) => {
                    let words: Vec<Vec<char>> = contents
                        .lines()
                        .map(|x| x.chars().collect())
                        .collect();
                    return Ok(words);
                }
            }
        }
    }
}
