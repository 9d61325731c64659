//! In-memory key-value store and command dispatcher.
//!
//! Grounded in `original_source/server.cpp`'s `execute_command`, which
//! matches on the first token of a parsed command and mutates a
//! module-level map directly. Per `SPEC_FULL.md` §9 ("process-wide state ...
//! pass an explicit store handle"), that module-level global becomes an
//! explicit [`Store`] value owned by whatever collaborator drives it (the
//! demonstration binary in `crate::bin::kv_server`, or a test).

use crate::hashmap::HashMap;
use crate::protocol::{Response, ERR_UNKNOWN};
use crate::sorted_set::SortedSet;

/// Owns the flat string map (`get`/`set`/`del`) and the registry of named
/// sorted sets (`zadd`/`zrem`/`zscore`/`zrank`/`zquery`). Never performs I/O;
/// `execute` is a pure function of the current state and the command.
pub struct Store {
    strings: HashMap<Vec<u8>>,
    sorted_sets: HashMap<SortedSet>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Store {
            strings: HashMap::new(),
            sorted_sets: HashMap::new(),
        }
    }

    /// Dispatches one parsed command (its arguments as raw byte strings,
    /// command name included as `cmd[0]`) and returns the response to send
    /// back to the client.
    pub fn execute(&mut self, cmd: &[Vec<u8>]) -> Response {
        let Some(name) = cmd.first() else {
            return err_unknown("empty command");
        };

        match name.as_slice() {
            b"get" => self.cmd_get(cmd),
            b"set" => self.cmd_set(cmd),
            b"del" => self.cmd_del(cmd),
            b"zadd" => self.cmd_zadd(cmd),
            b"zrem" => self.cmd_zrem(cmd),
            b"zscore" => self.cmd_zscore(cmd),
            b"zrank" => self.cmd_zrank(cmd),
            b"zquery" => self.cmd_zquery(cmd),
            other => {
                log::warn!("unrecognized command: {}", String::from_utf8_lossy(other));
                err_unknown(&format!(
                    "unknown command '{}'",
                    String::from_utf8_lossy(other)
                ))
            }
        }
    }

    fn cmd_get(&mut self, cmd: &[Vec<u8>]) -> Response {
        let Some(key) = cmd.get(1) else {
            return err_unknown("get requires 1 argument");
        };
        match self.strings.lookup(key) {
            Some(value) => Response::Str(value.clone()),
            None => Response::Nil,
        }
    }

    fn cmd_set(&mut self, cmd: &[Vec<u8>]) -> Response {
        let (Some(key), Some(value)) = (cmd.get(1), cmd.get(2)) else {
            return err_unknown("set requires 2 arguments");
        };
        self.strings.insert(key.clone(), value.clone());
        Response::Nil
    }

    fn cmd_del(&mut self, cmd: &[Vec<u8>]) -> Response {
        let Some(key) = cmd.get(1) else {
            return err_unknown("del requires 1 argument");
        };
        Response::Int(self.strings.remove(key).is_some() as i64)
    }

    fn cmd_zadd(&mut self, cmd: &[Vec<u8>]) -> Response {
        let (Some(key), Some(score_arg), Some(name)) = (cmd.get(1), cmd.get(2), cmd.get(3)) else {
            return err_unknown("zadd requires 3 arguments");
        };
        let Some(score) = parse_f64(score_arg) else {
            return err_unknown("zadd score must be a number");
        };
        if self.sorted_sets.lookup(key).is_none() {
            self.sorted_sets.insert(key.clone(), SortedSet::new());
        }
        let set = self
            .sorted_sets
            .lookup_mut(key)
            .expect("just ensured present");
        Response::Int(set.insert(name.clone(), score) as i64)
    }

    fn cmd_zrem(&mut self, cmd: &[Vec<u8>]) -> Response {
        let (Some(key), Some(name)) = (cmd.get(1), cmd.get(2)) else {
            return err_unknown("zrem requires 2 arguments");
        };
        let Some(set) = self.sorted_sets.lookup_mut(key) else {
            return Response::Int(0);
        };
        Response::Int(set.remove(name).is_some() as i64)
    }

    fn cmd_zscore(&mut self, cmd: &[Vec<u8>]) -> Response {
        let (Some(key), Some(name)) = (cmd.get(1), cmd.get(2)) else {
            return err_unknown("zscore requires 2 arguments");
        };
        match self.sorted_sets.lookup(key).and_then(|s| s.score(name)) {
            Some(score) => Response::Dbl(score),
            None => Response::Nil,
        }
    }

    /// A member's one-based rank, or `-1` if the set or the member doesn't
    /// exist, matching `original_source/sorted-set/tests/test_sorted_set.cpp`'s
    /// `test_rank_on_empty_set`, which expects `-1` rather than a nil reply.
    fn cmd_zrank(&mut self, cmd: &[Vec<u8>]) -> Response {
        let (Some(key), Some(name)) = (cmd.get(1), cmd.get(2)) else {
            return err_unknown("zrank requires 2 arguments");
        };
        match self.sorted_sets.lookup(key).and_then(|s| s.rank(name)) {
            Some(rank) => Response::Int(rank as i64),
            None => Response::Int(-1),
        }
    }

    fn cmd_zquery(&mut self, cmd: &[Vec<u8>]) -> Response {
        let (Some(key), Some(score_arg), Some(name)) = (cmd.get(1), cmd.get(2), cmd.get(3)) else {
            return err_unknown("zquery requires at least 3 arguments");
        };
        let Some(score) = parse_f64(score_arg) else {
            return err_unknown("zquery score must be a number");
        };
        let offset: usize = match cmd.get(4) {
            Some(arg) => match parse_usize(arg) {
                Some(v) => v,
                None => return err_unknown("zquery offset must be a non-negative integer"),
            },
            None => 0,
        };
        let limit: usize = match cmd.get(5) {
            Some(arg) => match parse_usize(arg) {
                Some(v) => v,
                None => return err_unknown("zquery limit must be a non-negative integer"),
            },
            None => 100,
        };

        let Some(set) = self.sorted_sets.lookup(key) else {
            return Response::Arr(Vec::new());
        };

        let window = set.query_from(score, name, offset + limit);
        let elements = window
            .into_iter()
            .skip(offset)
            .flat_map(|(score, name)| [Response::Str(name), Response::Dbl(score)])
            .collect();
        Response::Arr(elements)
    }
}

fn err_unknown(message: &str) -> Response {
    Response::Err {
        code: ERR_UNKNOWN,
        message: message.as_bytes().to_vec(),
    }
}

fn parse_f64(arg: &[u8]) -> Option<f64> {
    std::str::from_utf8(arg).ok()?.parse().ok()
}

fn parse_usize(arg: &[u8]) -> Option<usize> {
    std::str::from_utf8(arg).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> Vec<Vec<u8>> {
        args.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    #[test]
    fn get_set_del_round_trip() {
        let mut store = Store::new();
        assert_eq!(store.execute(&cmd(&["get", "a"])), Response::Nil);
        assert_eq!(store.execute(&cmd(&["set", "a", "1"])), Response::Nil);
        assert_eq!(
            store.execute(&cmd(&["get", "a"])),
            Response::Str(b"1".to_vec())
        );
        assert_eq!(store.execute(&cmd(&["del", "a"])), Response::Int(1));
        assert_eq!(store.execute(&cmd(&["get", "a"])), Response::Nil);
        assert_eq!(store.execute(&cmd(&["del", "a"])), Response::Int(0));
    }

    #[test]
    fn zadd_reports_new_vs_updated_and_zscore_reflects_the_latest_value() {
        let mut store = Store::new();
        assert_eq!(
            store.execute(&cmd(&["zadd", "z", "1.0", "x"])),
            Response::Int(1)
        );
        assert_eq!(
            store.execute(&cmd(&["zadd", "z", "2.0", "x"])),
            Response::Int(0)
        );
        assert_eq!(
            store.execute(&cmd(&["zscore", "z", "x"])),
            Response::Dbl(2.0)
        );
        assert_eq!(store.execute(&cmd(&["zscore", "z", "y"])), Response::Nil);
    }

    #[test]
    fn zrem_and_zrank() {
        let mut store = Store::new();
        store.execute(&cmd(&["zadd", "z", "1.0", "a"]));
        store.execute(&cmd(&["zadd", "z", "2.0", "b"]));
        assert_eq!(store.execute(&cmd(&["zrank", "z", "b"])), Response::Int(2));
        assert_eq!(store.execute(&cmd(&["zrem", "z", "a"])), Response::Int(1));
        assert_eq!(store.execute(&cmd(&["zrank", "z", "b"])), Response::Int(1));
        assert_eq!(store.execute(&cmd(&["zrem", "z", "a"])), Response::Int(0));
    }

    #[test]
    fn zrank_on_an_absent_set_or_member_reports_negative_one() {
        let mut store = Store::new();
        assert_eq!(store.execute(&cmd(&["zrank", "z", "a"])), Response::Int(-1));
        store.execute(&cmd(&["zadd", "z", "1.0", "a"]));
        assert_eq!(store.execute(&cmd(&["zrank", "z", "b"])), Response::Int(-1));
    }

    #[test]
    fn zquery_returns_alternating_name_score_pairs() {
        let mut store = Store::new();
        store.execute(&cmd(&["zadd", "z", "11", "jeff"]));
        store.execute(&cmd(&["zadd", "z", "10", "tyler"]));
        store.execute(&cmd(&["zadd", "z", "0", "won"]));

        let resp = store.execute(&cmd(&["zquery", "z", "5", "adam"]));
        assert_eq!(
            resp,
            Response::Arr(vec![
                Response::Str(b"tyler".to_vec()),
                Response::Dbl(10.0),
                Response::Str(b"jeff".to_vec()),
                Response::Dbl(11.0),
            ])
        );
    }

    #[test]
    fn unknown_command_reports_an_err_response() {
        let mut store = Store::new();
        let resp = store.execute(&cmd(&["frobnicate", "x"]));
        assert!(matches!(
            resp,
            Response::Err {
                code: ERR_UNKNOWN,
                ..
            }
        ));
    }

    #[test]
    fn zadd_with_a_non_numeric_score_reports_an_error() {
        let mut store = Store::new();
        let resp = store.execute(&cmd(&["zadd", "z", "not-a-number", "x"]));
        assert!(matches!(resp, Response::Err { .. }));
    }
}
