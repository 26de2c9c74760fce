use gallery_core::{Action, Project, QueryState, SortDirection, SortKey};
use gallery_search::{evaluate, Facets};
use std::time::Instant;

const PLATFORMS: [&str; 4] = ["android", "linux", "windows", "macos"];
const TAGS: [&str; 12] = [
    "vision", "audio", "llm", "generative ai", "robotics", "iot", "camera", "speech", "npu", "sdk", "demo", "tools",
];

fn gen_project(i: usize) -> Project {
    Project {
        name: format!("project-{i:06}"),
        author: Some(format!("author{}", i % 50)),
        link: format!("https://example.com/p/{i}"),
        description: format!("sample project number {i} for {}", TAGS[i % TAGS.len()]),
        language: Some(if i % 2 == 0 { "Python" } else { "C++" }.to_string()),
        stars: if i % 7 == 0 { None } else { Some((i * 37 % 5000) as u64) },
        last_updated: Some(format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1)),
        platforms: smallvec::smallvec![PLATFORMS[i % 4].to_string(), PLATFORMS[(i / 4) % 4].to_string()],
        tags: smallvec::smallvec![TAGS[i % TAGS.len()].to_string(), TAGS[(i / 3) % TAGS.len()].to_string()],
        is_showcase: i % 100 == 0,
    }
}

fn percentile_us(xs: &mut [u128], p: f64) -> u128 {
    xs.sort_unstable();
    let idx = ((xs.len() as f64 - 1.0) * p).round() as usize;
    xs[idx]
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn main() {
    let n: usize = env_or("GALLERY_BENCH_DOCS", 50_000);
    let page_size: usize = env_or("GALLERY_BENCH_PAGE_SIZE", 20);
    let rounds: usize = env_or("GALLERY_BENCH_ROUNDS", 20).max(1);

    eprintln!("generating catalog: {} projects", n);
    let t0 = Instant::now();
    let records: Vec<Project> = (0..n).map(gen_project).collect();
    let gen_ms = t0.elapsed().as_secs_f64() * 1_000.0;

    let t1 = Instant::now();
    let facets = Facets::from_records(&records);
    let facet_ms = t1.elapsed().as_secs_f64() * 1_000.0;

    let base = QueryState::default();
    let mut queries: Vec<(&str, Vec<QueryState>)> = Vec::new();
    queries.push(("unfiltered", vec![base.clone()]));
    queries.push((
        "platform",
        PLATFORMS.iter().map(|p| base.clone().apply(Action::TogglePlatform(p.to_string()))).collect(),
    ));
    queries.push((
        "tags",
        TAGS.windows(2)
            .map(|w| base.clone().apply(Action::ToggleTag(w[0].to_string())).apply(Action::ToggleTag(w[1].to_string())))
            .collect(),
    ));
    queries.push((
        "search",
        ["vision", "author7", "0042", "c++"].iter().map(|q| base.clone().apply(Action::SetSearch(q.to_string()))).collect(),
    ));
    queries.push((
        "sort",
        SortKey::ALL
            .into_iter()
            .flat_map(|k| {
                [SortDirection::Asc, SortDirection::Desc]
                    .into_iter()
                    .map(move |d| QueryState::default().apply(Action::SetSort(k)).apply(Action::SetDirection(d)))
            })
            .collect(),
    ));

    println!("catalog: generate={:.1}ms facets={:.1}ms projects={} tags={}", gen_ms, facet_ms, n, facets.tags.len());
    for (label, states) in &queries {
        let mut times: Vec<u128> = Vec::with_capacity(states.len() * rounds);
        let mut matches = 0usize;
        for _ in 0..rounds {
            for s in states {
                let t = Instant::now();
                matches = evaluate(&records, s, page_size).total_matches;
                times.push(t.elapsed().as_micros());
            }
        }
        let p50 = percentile_us(&mut times.clone(), 0.50) as f64 / 1000.0;
        let p99 = percentile_us(&mut times, 0.99) as f64 / 1000.0;
        println!("{}: p50={:.3}ms p99={:.3}ms ({} states x {} rounds, last_matches={})", label, p50, p99, states.len(), rounds, matches);
    }
}
