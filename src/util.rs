use crate::Symbol;
use rand;
use rand::Rng;

pub fn join_vec<T>(a: &Vec<T>, b: &Vec<T>) -> Vec<T>
where
    T: Clone,
{
    let mut res: Vec<T> = a.clone();
    res.extend_from_slice(b);
    return res;
}

pub fn is_strict_prefix<T>(w: &Vec<T>, we: &Vec<T>) -> bool
where
    T: PartialEq,
{
    if w.len() >= we.len() {
        return false;
    }
    return we[0..w.len()] == w[..];
}

pub fn fmt_word<A: Symbol>(w: &Vec<A>) -> String {
    if w.is_empty() {
        return "ε".to_string();
    }
    return w.iter().map(|c| format!("{}", c)).collect::<Vec<String>>().join("");
}

fn random_choose<T>(v: &Vec<T>, rng: &mut dyn rand::RngCore) -> T
where
    T: Copy,
{
    return v[rng.gen_range(0, v.len())];
}

fn make_random_string<T>(len: usize, alphabet: &Vec<T>, rng: &mut dyn rand::RngCore) -> Vec<T>
where
    T: Symbol,
{
    return (0..len).map(|_| random_choose(alphabet, rng)).collect();
}

pub fn make_random_strings<T>(
    num: usize,
    max_len: usize,
    alphabet: &Vec<T>,
    rng: &mut dyn rand::RngCore,
) -> Vec<Vec<T>>
where
    T: Symbol,
{
    return (0..num)
        .map(|_| make_random_string(rng.gen_range(0, max_len + 1), alphabet, rng))
        .collect();
}

// randomized search for a word the two acceptors disagree on
pub fn find_diff_langs<A>(
    a: &dyn Fn(&Vec<A>) -> bool,
    b: &dyn Fn(&Vec<A>) -> bool,
    alphabet: &Vec<A>,
    sample_size: usize,
    max_len: usize,
    rng: &mut dyn rand::RngCore,
) -> Option<Vec<A>>
where
    A: Symbol,
{
    for w in make_random_strings(sample_size, max_len, alphabet, rng) {
        if a(&w) != b(&w) {
            return Some(w);
        }
    }
    return None;
}
