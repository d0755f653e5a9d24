use chrono::NaiveDate;
use strata_core::StrataError;
use strata_history::activity::{annotate, ActivityAnnotations};
use strata_history::commit::{CommitRecord, FileStat};
use strata_history::rollup::group_key;
use strata_history::segments::{segment, BoundaryEvent, SegmentOptions};

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(n - 1)
}

fn commit(author: &str, day_no: i64, files: Vec<FileStat>) -> CommitRecord {
    CommitRecord {
        hash: format!("{author}@{day_no}"),
        title: "work".into(),
        author: author.into(),
        date: day(day_no),
        files,
    }
}

/// Deterministic pseudo-random histories, newest first.
fn generated_history(seed: u64, len: usize) -> Vec<CommitRecord> {
    let authors = ["alice", "bob", "carol", "dave"];
    let paths = ["src/a.rs", "src/core/b.rs", "docs/guide.md", "README.md", "tests/it/x.rs"];

    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move |bound: u64| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) % bound
    };

    let mut day_no = 1i64;
    let mut oldest_first = Vec::with_capacity(len);
    for _ in 0..len {
        // Mostly small steps, sometimes long silences.
        day_no += match next(10) {
            0 => 40 + next(120) as i64,
            1..=3 => 0,
            _ => next(6) as i64,
        };
        let author = authors[next(authors.len() as u64) as usize];
        let files = (0..next(4))
            .map(|_| {
                FileStat::new(
                    paths[next(paths.len() as u64) as usize],
                    next(50),
                    next(20),
                )
            })
            .collect();
        oldest_first.push(commit(author, day_no, files));
    }
    oldest_first.reverse();
    oldest_first
}

fn option_grid() -> Vec<SegmentOptions> {
    let mut grid = Vec::new();
    for days in [0, 3, 10] {
        for authors in [5, 90] {
            for depth in [0, 1, 2] {
                grid.push(SegmentOptions::new(days, authors, depth));
            }
        }
    }
    grid
}

#[test]
fn segments_are_ordered_and_cover_every_commit() {
    for seed in 0..20 {
        let commits = generated_history(seed, 60);
        for opts in option_grid() {
            let segments = segment(&commits, &opts).unwrap();

            for pair in segments.windows(2) {
                assert!(pair[0].to_date <= pair[1].from_date, "seed {seed}: {opts:?}");
            }
            for s in &segments {
                assert!(s.from_date <= s.to_date);
                assert!(s.commit_count > 0);
                assert_eq!(s.dates, format!("{} - {}", s.from_date, s.to_date));
            }

            for c in &commits {
                assert!(
                    segments
                        .iter()
                        .any(|s| s.from_date <= c.date && c.date <= s.to_date),
                    "seed {seed}: commit {} on {} is outside every segment",
                    c.hash,
                    c.date
                );
            }
        }
    }
}

#[test]
fn counts_and_churn_are_conserved() {
    for seed in 0..20 {
        let commits = generated_history(seed, 80);
        let added: u64 = commits.iter().map(CommitRecord::added).sum();
        let deleted: u64 = commits.iter().map(CommitRecord::deleted).sum();

        for opts in option_grid() {
            let segments = segment(&commits, &opts).unwrap();
            let commit_total: u64 = segments.iter().map(|s| s.commit_count).sum();
            assert_eq!(commit_total, commits.len() as u64);
            assert_eq!(segments.iter().map(|s| s.added).sum::<u64>(), added);
            assert_eq!(segments.iter().map(|s| s.deleted).sum::<u64>(), deleted);

            for s in &segments {
                let by_author: u64 = s.authors.iter().map(|a| a.commits).sum();
                assert_eq!(by_author, s.commit_count);
                let dir_added: u64 = s.directory_churn.iter().map(|d| d.added).sum();
                let dir_deleted: u64 = s.directory_churn.iter().map(|d| d.deleted).sum();
                assert_eq!((dir_added, dir_deleted), (s.added, s.deleted));
                assert!(s
                    .directory_churn
                    .windows(2)
                    .all(|w| w[0].churn() >= w[1].churn()));
            }
        }
    }
}

#[test]
fn rollup_at_depth_zero_is_identity() {
    for p in ["a", "src/a.rb", "deep/er/path/file.txt", "/abs", ""] {
        assert_eq!(group_key(p, 0, None), p);
    }
}

#[test]
fn first_sightings_match_in_both_directions() {
    let commits = generated_history(7, 50);
    let ann = ActivityAnnotations::compute(&commits, 90);

    let oldest_first: Vec<&CommitRecord> = commits.iter().rev().collect();
    for author in ["alice", "bob", "carol", "dave"] {
        let positions: Vec<usize> = oldest_first
            .iter()
            .enumerate()
            .filter(|(_, c)| c.author == author)
            .map(|(i, _)| i)
            .collect();
        let (Some(&first), Some(&last)) = (positions.first(), positions.last()) else {
            continue;
        };

        assert!(ann.arrivals[first].first_sighting);
        assert!(ann.departures[last].first_sighting);
        for &i in &positions {
            assert_eq!(ann.arrivals[i].first_sighting, i == first);
            assert_eq!(ann.departures[i].first_sighting, i == last);
        }
    }
}

#[test]
fn annotator_is_direction_agnostic() {
    let commits = generated_history(3, 40);
    let forward = annotate(commits.iter(), 30);
    let mut backward = annotate(commits.iter().rev(), 30);
    backward.reverse();

    // Stale gaps seen walking one way mark the other end of the same gap.
    let stale_forward = forward.iter().filter(|f| f.stale_gap).count();
    let stale_backward = backward.iter().filter(|f| f.stale_gap).count();
    assert_eq!(stale_forward, stale_backward);
}

#[test]
fn single_author_without_churn_is_one_segment() {
    let commits = vec![
        commit("alice", 3, vec![]),
        commit("alice", 2, vec![]),
        commit("alice", 1, vec![]),
    ];
    let segments = segment(&commits, &SegmentOptions::default()).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].commit_count, 3);
    assert_eq!(segments[0].added, 0);
    assert_eq!(segments[0].deleted, 0);
    assert_eq!(segments[0].authors.len(), 1);
    assert_eq!(segments[0].authors[0].author, "alice");
    assert_eq!(segments[0].authors[0].commits, 3);
}

#[test]
fn arriving_author_opens_second_segment() {
    let commits = vec![commit("bob", 50, vec![]), commit("alice", 1, vec![])];
    let segments = segment(&commits, &SegmentOptions::new(10, 90, 2)).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(
        segments[1].boundary_event,
        BoundaryEvent::NewAuthor {
            author: "bob".into(),
            first_seen: true,
        }
    );
    assert_eq!(segments[1].to_date, day(50));
    assert_eq!(segments[1].authors[0].author, "bob");
}

#[test]
fn directory_churn_rolls_up_to_depth() {
    let commits = vec![commit(
        "alice",
        1,
        vec![FileStat::new("src/a.rb", 10, 2), FileStat::new("src/b.rb", 1, 1)],
    )];
    let segments = segment(&commits, &SegmentOptions::new(10, 90, 1)).unwrap();

    assert_eq!(segments.len(), 1);
    let churn = &segments[0].directory_churn;
    assert_eq!(churn.len(), 1);
    assert_eq!(churn[0].group, "src/*");
    assert_eq!((churn[0].added, churn[0].deleted), (11, 3));
}

#[test]
fn empty_history_is_an_error() {
    let result = segment(&[], &SegmentOptions::default());
    assert!(matches!(result, Err(StrataError::EmptyHistory)));
}
