use readalong::gap::fill_gaps;
use readalong::matcher::{Candidate, MatchSource};
use readalong::{
    BlockId, BlockIndex, Document, HeadlessSurface, HighlightRole, SegmentIndex, Session,
    SyncConfig, TickOutcome, TimelineSegment,
};

fn segment(text: &str, begin: i64, end: i64) -> TimelineSegment {
    TimelineSegment {
        order_index: 0,
        text: text.to_string(),
        time_begin_ms: begin,
        time_end_ms: end,
        text_begin: None,
        text_end: None,
    }
}

fn with_offsets(mut segment: TimelineSegment, begin: i64, end: i64) -> TimelineSegment {
    segment.text_begin = Some(begin);
    segment.text_end = Some(end);
    segment
}

fn session(segments: Vec<TimelineSegment>, paragraphs: &[&str]) -> Session {
    Session::new(
        SegmentIndex::new(segments),
        &Document::from_paragraphs(paragraphs.iter().copied()),
        SyncConfig::default(),
    )
}

fn highlighted(session: &Session) -> Vec<u32> {
    session
        .highlight()
        .map(|set| set.order_indices())
        .unwrap_or_default()
}

#[test]
fn end_to_end_two_segments() {
    let mut session = Session::from_sources(
        r#"[
            {"text": "帕特农神庙", "time_begin": 0, "time_end": 2000},
            {"text": "大理石之争", "time_begin": 2000, "time_end": 4000}
        ]"#,
        "帕特农神庙的历史\n\n大理石之争持续了两百年\n",
        SyncConfig::default(),
    )
    .unwrap();
    let mut surface = HeadlessSurface::new();

    session.on_time_update(1.0, &mut surface);
    assert_eq!(highlighted(&session), [0]);
    assert_eq!(surface.role_of(BlockId(0)), Some(HighlightRole::Primary));

    session.on_time_update(3.0, &mut surface);
    assert_eq!(highlighted(&session), [1]);
    assert_eq!(surface.role_of(BlockId(0)), None);
    assert_eq!(surface.role_of(BlockId(1)), Some(HighlightRole::Primary));
    assert_eq!(surface.indicator(), Some(BlockId(1)));
    assert_eq!(surface.last_scroll().unwrap().block, BlockId(1));
}

#[test]
fn resolving_the_same_segment_twice_mutates_nothing() {
    let mut session = session(
        vec![segment("帕特农神庙", 0, 2000)],
        &["帕特农神庙的历史"],
    );
    let mut surface = HeadlessSurface::new();

    session.on_time_update(0.2, &mut surface);
    let before = session.highlight().cloned();
    surface.clear_ops();

    let tick = session.on_time_update(0.9, &mut surface);

    assert_eq!(tick.outcome, TickOutcome::Unchanged);
    assert!(tick.layout.is_none());
    assert!(surface.ops().is_empty());
    assert_eq!(session.highlight().cloned(), before);
}

#[test]
fn offsets_win_over_text_similarity() {
    // Blocks 0-2 cover chars [0, 10); block 3 covers exactly [10, 25).
    let paragraphs = [
        "帕特农神庙",
        "帕特农神",
        "庙",
        "一二三四五六七八九十甲乙丙丁戊",
        "帕特农神庙帕特农神庙",
    ];
    let mut session = session(
        vec![with_offsets(segment("帕特农神庙", 0, 2000), 10, 25)],
        &paragraphs,
    );
    let mut surface = HeadlessSurface::new();

    session.on_time_update(1.0, &mut surface);

    assert_eq!(highlighted(&session), [3]);
}

#[test]
fn forward_bias_prefers_block_after_anchor() {
    let mut paragraphs = vec!["填充段落内容"; 12];
    paragraphs[2] = "重复出现的句子";
    paragraphs[5] = "锚点所在的段落";
    paragraphs[9] = "重复出现的句子";
    let mut session = session(
        vec![
            segment("锚点所在的段落", 0, 1000),
            segment("重复出现的句子", 1000, 2000),
        ],
        &paragraphs,
    );
    let mut surface = HeadlessSurface::new();

    session.on_time_update(0.5, &mut surface);
    assert_eq!(session.state().anchor_block, Some(5));

    session.on_time_update(1.5, &mut surface);
    assert_eq!(highlighted(&session), [9]);
    assert_eq!(session.state().anchor_block, Some(9));
}

#[test]
fn length_floor_boundary() {
    let mut short = session(vec![segment("帕特农神", 0, 2000)], &["帕特农神"]);
    let mut surface = HeadlessSurface::new();
    let tick = short.on_time_update(1.0, &mut surface);
    assert_eq!(tick.outcome, TickOutcome::Missed { segment_index: 0 });
    assert!(surface.marked().is_empty());

    let mut exact = session(vec![segment("帕特农神庙", 0, 2000)], &["帕特农神庙"]);
    exact.on_time_update(1.0, &mut surface);
    let set = exact.highlight().unwrap();
    assert_eq!(set.order_indices(), [0]);
    approx::assert_relative_eq!(set.blocks[0].score, 1.0);
}

#[test]
fn short_gaps_between_matches_are_filled() {
    let paragraphs: Vec<String> = (0..14).map(|i| format!("第{i:02}段")).collect();
    let index = BlockIndex::build(&Document::from_paragraphs(paragraphs));
    let run = |indices: &[usize]| {
        let mut matched: Vec<Candidate> = indices
            .iter()
            .map(|&i| Candidate::new(i, 1.0, MatchSource::Offset))
            .collect();
        fill_gaps(&mut matched, &index, SyncConfig::default().gap_fill_span);
        matched.iter().map(|c| c.order_index).collect::<Vec<_>>()
    };

    assert_eq!(run(&[4, 6]), [4, 5, 6]);
    assert_eq!(run(&[4, 11]), [4, 11]);
}

#[test]
fn backward_seek_resets_anchor_and_highlight() {
    let mut paragraphs = vec!["填充段落内容"; 24];
    paragraphs[3] = "开头提到的事件";
    paragraphs[20] = "结尾的总结陈词";
    let mut session = session(
        vec![
            segment("开头提到的事件", 30_000, 60_000),
            segment("结尾的总结陈词", 90_000, 110_000),
        ],
        &paragraphs,
    );
    let mut surface = HeadlessSurface::new();

    session.on_time_update(100.0, &mut surface);
    assert_eq!(session.state().anchor_block, Some(20));

    surface.clear_ops();
    let tick = session.on_time_update(40.0, &mut surface);

    assert!(tick.seeked);
    assert_eq!(tick.outcome, TickOutcome::Highlighted { segment_index: 0 });
    assert_eq!(highlighted(&session), [3]);
    assert_eq!(session.state().anchor_block, Some(3));
    assert_eq!(surface.ops()[0].to_string(), "unmark 20");
}

#[test]
fn small_backward_jitter_is_not_a_seek() {
    let mut session = session(
        vec![segment("帕特农神庙", 0, 5000)],
        &["帕特农神庙的历史"],
    );
    let mut surface = HeadlessSurface::new();

    session.on_time_update(3.0, &mut surface);
    let tick = session.on_time_update(2.2, &mut surface);

    assert!(!tick.seeked);
    assert_eq!(tick.outcome, TickOutcome::Unchanged);
    assert_eq!(highlighted(&session), [0]);
}

#[test]
fn transcript_gap_keeps_previous_highlight() {
    let mut session = session(
        vec![segment("帕特农神庙", 0, 1000), segment("大理石之争", 3000, 4000)],
        &["帕特农神庙的历史", "大理石之争持续了两百年"],
    );
    let mut surface = HeadlessSurface::new();

    session.on_time_update(0.5, &mut surface);
    let tick = session.on_time_update(2.0, &mut surface);

    assert_eq!(tick.outcome, TickOutcome::Gap);
    assert_eq!(highlighted(&session), [0]);
    assert_eq!(surface.role_of(BlockId(0)), Some(HighlightRole::Primary));
}

#[test]
fn nested_blocks_mark_their_container() {
    let mut session = Session::from_sources(
        r#"[{"text": "第二项的内容", "time_begin": 0, "time_end": 2000}]"#,
        "导言段落\n\n- 苹果香蕉橘子\n- 第二项的内容\n",
        SyncConfig::default(),
    )
    .unwrap();
    let mut surface = HeadlessSurface::new();

    let tick = session.on_time_update(1.0, &mut surface);
    let list = session.highlight().unwrap().containers.clone();
    assert_eq!(list.len(), 1);
    assert_eq!(surface.role_of(list[0]), Some(HighlightRole::Container));

    let ticket = tick.layout.unwrap();
    let primary = session.highlight().unwrap().primary().unwrap().id;
    surface.set_offset(primary, 28.0);
    session.after_layout(ticket, &mut surface);
    assert_eq!(surface.alignment_of(primary).unwrap().padding_left_px, 52.0);
}

#[test]
fn code_blocks_are_never_highlighted() {
    let mut session = Session::from_sources(
        r#"[{"text": "帕特农神庙的历史", "time_begin": 0, "time_end": 2000}]"#,
        "导言段落文字\n\n```\n帕特农神庙的历史\n```\n",
        SyncConfig::default(),
    )
    .unwrap();
    let mut surface = HeadlessSurface::new();

    let tick = session.on_time_update(1.0, &mut surface);

    assert_eq!(session.blocks().len(), 1);
    assert_eq!(tick.outcome, TickOutcome::Missed { segment_index: 0 });
    assert!(surface.marked().is_empty());
}
