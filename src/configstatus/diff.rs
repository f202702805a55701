// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unified-diff formatting for machine config changes (spec §4.8
//! "Diff formatting", surfaced to operators via `MachinePendingUpdates`).

const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// Longest-common-subsequence line diff, reduced to a sequence of
/// equal/delete/insert ops over both line lists.
fn line_ops(old: &[&str], new: &[&str]) -> Vec<(Op, usize, usize)> {
    let (n, m) = (old.len(), new.len());
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push((Op::Equal, i, j));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            ops.push((Op::Delete, i, j));
            i += 1;
        } else {
            ops.push((Op::Insert, i, j));
            j += 1;
        }
    }
    while i < n {
        ops.push((Op::Delete, i, j));
        i += 1;
    }
    while j < m {
        ops.push((Op::Insert, i, j));
        j += 1;
    }
    ops
}

/// Produces a unified diff of `old` against `new` (spec §4.8): hunks are
/// `@@ -a,b +c,d @@`, a single-line side omits its count, and a final line
/// without a trailing newline is marked `\ No newline at end of file`.
#[must_use]
pub fn compute_diff(old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }

    let old_ends_newline = old.ends_with('\n') || old.is_empty();
    let new_ends_newline = new.ends_with('\n') || new.is_empty();
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();
    // `split` leaves a trailing empty element when the string ends in '\n';
    // drop it so line indices match real line numbers.
    let old_lines = if old_ends_newline && !old.is_empty() {
        &old_lines[..old_lines.len() - 1]
    } else {
        &old_lines[..]
    };
    let new_lines = if new_ends_newline && !new.is_empty() {
        &new_lines[..new_lines.len() - 1]
    } else {
        &new_lines[..]
    };

    let ops = line_ops(old_lines, new_lines);

    // Group ops into hunks separated by runs of >= 2*CONTEXT_LINES equal ops.
    let mut hunks: Vec<Vec<(Op, usize, usize)>> = Vec::new();
    let mut current: Vec<(Op, usize, usize)> = Vec::new();
    let mut equal_run = 0usize;
    for op in ops {
        if op.0 == Op::Equal {
            current.push(op);
            equal_run += 1;
            if equal_run > CONTEXT_LINES * 2 && !current[..current.len() - CONTEXT_LINES].is_empty()
            {
                let split_at = current.len() - CONTEXT_LINES;
                let tail = current.split_off(split_at);
                if current.iter().any(|o| o.0 != Op::Equal) {
                    hunks.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                current = tail;
            }
        } else {
            current.push(op);
            equal_run = 0;
        }
    }
    if current.iter().any(|o| o.0 != Op::Equal) {
        hunks.push(current);
    }

    let mut out = String::new();
    for hunk in hunks {
        // Trim leading/trailing pure-equal overflow beyond CONTEXT_LINES.
        let first_change = hunk.iter().position(|o| o.0 != Op::Equal).unwrap_or(0);
        let last_change = hunk.iter().rposition(|o| o.0 != Op::Equal).unwrap_or(0);
        let start = first_change.saturating_sub(CONTEXT_LINES);
        let end = (last_change + CONTEXT_LINES + 1).min(hunk.len());
        let body = &hunk[start..end];

        let old_start = body
            .iter()
            .find(|o| o.0 != Op::Insert)
            .map(|o| o.1)
            .unwrap_or(0);
        let new_start = body
            .iter()
            .find(|o| o.0 != Op::Delete)
            .map(|o| o.2)
            .unwrap_or(0);
        let old_count = body.iter().filter(|o| o.0 != Op::Insert).count();
        let new_count = body.iter().filter(|o| o.0 != Op::Delete).count();

        let old_header = if old_count == 1 {
            format!("{}", old_start + 1)
        } else {
            format!("{},{}", if old_count == 0 { old_start } else { old_start + 1 }, old_count)
        };
        let new_header = if new_count == 1 {
            format!("{}", new_start + 1)
        } else {
            format!("{},{}", if new_count == 0 { new_start } else { new_start + 1 }, new_count)
        };
        out.push_str(&format!("@@ -{old_header} +{new_header} @@\n"));

        for &(op, oi, ni) in body.iter() {
            let (marker, line) = match op {
                Op::Equal => (' ', old_lines[oi]),
                Op::Delete => ('-', old_lines[oi]),
                Op::Insert => ('+', new_lines[ni]),
            };
            out.push(marker);
            out.push_str(line);
            out.push('\n');

            let at_old_end = matches!(op, Op::Equal | Op::Delete) && oi + 1 == old_lines.len();
            let at_new_end = matches!(op, Op::Equal | Op::Insert) && ni + 1 == new_lines.len();
            if (at_old_end && !old_ends_newline) || (at_new_end && !new_ends_newline) {
                out.push_str("\\ No newline at end of file\n");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_input_produces_empty_diff() {
        assert_eq!(compute_diff("a\nb\nc\n", "a\nb\nc\n"), "");
    }

    #[test]
    fn single_line_change_has_single_line_hunk_header() {
        let diff = compute_diff("a\nb\nc\n", "a\nX\nc\n");
        assert!(diff.contains("@@ -2 +2 @@"), "{diff}");
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+X\n"));
    }

    #[test]
    fn missing_trailing_newline_is_marked() {
        let diff = compute_diff("a\nb", "a\nc");
        assert!(diff.contains("\\ No newline at end of file"));
    }

    #[test]
    fn multi_line_replacement_reports_ranges() {
        let old = "1\n2\n3\n4\n5\n";
        let new = "1\n2\nX\nY\n4\n5\n";
        let diff = compute_diff(old, new);
        assert!(diff.starts_with("@@ -"));
        assert!(diff.contains("-3\n"));
        assert!(diff.contains("+X\n"));
        assert!(diff.contains("+Y\n"));
    }
}
