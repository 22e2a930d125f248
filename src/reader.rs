//! Score Reader.
//!
//! Parses raw partwise score-exchange XML bytes into a [`ParsedScore`]: a
//! header plus either a single primary melodic line or, for polyphonic
//! input, several concurrent lines. Depends only on the DOM-shaped read
//! interface `roxmltree` provides; no other component touches `roxmltree`
//! directly.

use roxmltree::{Document, Node};

use crate::error::HarmonizeError;
use crate::key::Mode;
use crate::note::{MelodicLine, NoteEvent, Ticks};
use crate::pitch::{to_midi, REST};

/// Parsed score-level attributes.
#[derive(Debug, Clone)]
pub struct ScoreHeader {
    pub divisions: u32,
    pub beats: u8,
    pub beat_type: u8,
    pub fifths: i32,
    pub mode: Mode,
    pub original_part_name: String,
}

/// The result of reading a score: its header plus the extracted melodic
/// material.
#[derive(Debug, Clone)]
pub struct ParsedScore {
    pub header: ScoreHeader,
    /// The topmost line, used to drive chord selection.
    pub primary_melody: MelodicLine,
    /// Additional concurrent lines for polyphonic input, preserved for
    /// combined output but not consulted by the Chord Selector.
    pub other_lines: Vec<MelodicLine>,
    pub is_polyphonic: bool,
    pub total_note_events: usize,
}

/// Parse `bytes` as a partwise score. Malformed attributes default rather
/// than fail; see `read_attributes` for which ones.
pub fn read_score(bytes: &[u8]) -> Result<ParsedScore, HarmonizeError> {
    let xml = std::str::from_utf8(bytes)
        .map_err(|e| HarmonizeError::InvalidFormat(format!("input is not valid UTF-8: {e}")))?;

    let doc = Document::parse(xml)
        .map_err(|e| HarmonizeError::InvalidFormat(format!("XML parse error: {e}")))?;

    let root = doc.root_element();
    match root.tag_name().name() {
        "score-partwise" => {}
        "score-timewise" => return Err(HarmonizeError::UnsupportedFormat),
        other => {
            return Err(HarmonizeError::InvalidFormat(format!(
                "expected score-partwise root, found {other}"
            )))
        }
    }

    let parts: Vec<Node> = root
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "part")
        .collect();
    if parts.is_empty() {
        return Err(HarmonizeError::NoParts);
    }

    let original_part_name = first_part_name(&root, parts[0]);
    let (divisions, beats, beat_type, fifths, mode) = read_attributes(parts[0]);

    let mut per_part_lines: Vec<Vec<NoteEvent>> = Vec::with_capacity(parts.len());
    let mut total_note_events = 0usize;
    for part in &parts {
        let notes = read_part_notes(*part, divisions);
        total_note_events += notes.len();
        per_part_lines.push(notes);
    }

    let any_simultaneous_within_part = per_part_lines.iter().any(|notes| has_duplicate_onset(notes));
    let parts_overlap_in_time = parts.len() > 1 && any_cross_part_overlap(&per_part_lines);
    let is_polyphonic = any_simultaneous_within_part || parts_overlap_in_time;

    let (primary_melody, other_lines) = if is_polyphonic {
        split_polyphonic(&per_part_lines)
    } else {
        let primary = MelodicLine { notes: per_part_lines[0].clone() };
        let rest = per_part_lines[1..]
            .iter()
            .map(|notes| MelodicLine { notes: notes.clone() })
            .collect();
        (primary, rest)
    };

    if primary_melody.sounding_count() == 0 {
        return Err(HarmonizeError::EmptyMelody);
    }

    Ok(ParsedScore {
        header: ScoreHeader {
            divisions,
            beats,
            beat_type,
            fifths,
            mode,
            original_part_name,
        },
        primary_melody,
        other_lines,
        is_polyphonic,
        total_note_events,
    })
}

fn get_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.tag_name().name() == tag)
}

fn get_child_text(node: Node, tag: &str) -> Option<String> {
    get_child(node, tag).and_then(|n| n.text()).map(|s| s.trim().to_string())
}

fn first_part_name(root: &Node, first_part: Node) -> String {
    let part_id = first_part.attribute("id");
    if let Some(part_list) = get_child(*root, "part-list") {
        for score_part in part_list.children().filter(|n| n.has_tag_name("score-part")) {
            if part_id.is_none() || score_part.attribute("id") == part_id {
                if let Some(name) = get_child_text(score_part, "part-name") {
                    if !name.is_empty() {
                        return name;
                    }
                }
            }
        }
    }
    "Part 1".to_string()
}

/// Reads divisions/time/key from the first `<attributes>` block in `part`,
/// defaulting malformed or missing values.
fn read_attributes(part: Node) -> (u32, u8, u8, i32, Mode) {
    let attributes = part
        .children()
        .filter(|n| n.has_tag_name("measure"))
        .flat_map(|m| m.children())
        .find(|n| n.has_tag_name("attributes"));

    let Some(attrs) = attributes else {
        return (1, 4, 4, 0, Mode::Major);
    };

    let divisions = get_child_text(attrs, "divisions")
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&d| d >= 1)
        .unwrap_or(1);

    let (beats, beat_type) = get_child(attrs, "time")
        .map(|t| {
            let beats = get_child_text(t, "beats").and_then(|s| s.parse::<u8>().ok()).unwrap_or(4);
            let beat_type = get_child_text(t, "beat-type").and_then(|s| s.parse::<u8>().ok()).unwrap_or(4);
            (beats, beat_type)
        })
        .unwrap_or((4, 4));

    let (fifths, mode) = get_child(attrs, "key")
        .map(|k| {
            let fifths = get_child_text(k, "fifths").and_then(|s| s.parse::<i32>().ok()).unwrap_or(0);
            let mode = get_child_text(k, "mode")
                .map(|s| Mode::from_str_lossy(&s))
                .unwrap_or(Mode::Major);
            (fifths, mode)
        })
        .unwrap_or((0, Mode::Major));

    (divisions, beats, beat_type, fifths, mode)
}

/// Extracts the note sequence of one part, tracking onset via a running
/// tick counter that `<chord/>` notes do not advance.
fn read_part_notes(part: Node, _divisions: u32) -> Vec<NoteEvent> {
    let mut notes = Vec::new();
    let mut tick: Ticks = 0;
    let mut prev_onset: Ticks = 0;

    for measure in part.children().filter(|n| n.has_tag_name("measure")) {
        for note_node in measure.children().filter(|n| n.has_tag_name("note")) {
            let is_chord = note_node.children().any(|n| n.has_tag_name("chord"));
            let duration = get_child_text(note_node, "duration")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0);

            let onset = if is_chord { prev_onset } else { tick };

            let pitch = if get_child(note_node, "rest").is_some() {
                REST
            } else if let Some(pitch_node) = get_child(note_node, "pitch") {
                parse_pitch(pitch_node)
            } else {
                REST
            };

            notes.push(NoteEvent { pitch, duration, onset });

            if !is_chord {
                tick += duration;
                prev_onset = onset;
            }
        }
    }
    notes
}

fn parse_pitch(pitch_node: Node) -> i32 {
    let step = get_child_text(pitch_node, "step").unwrap_or_else(|| "C".to_string());
    let step_idx = match step.as_str() {
        "C" => 0,
        "D" => 1,
        "E" => 2,
        "F" => 3,
        "G" => 4,
        "A" => 5,
        "B" => 6,
        _ => 0,
    };
    let octave = get_child_text(pitch_node, "octave").and_then(|s| s.parse::<i32>().ok()).unwrap_or(4);
    let alter = get_child_text(pitch_node, "alter").and_then(|s| s.parse::<i32>().ok()).unwrap_or(0);
    to_midi(step_idx, alter, octave)
}

fn has_duplicate_onset(notes: &[NoteEvent]) -> bool {
    let mut onsets: Vec<Ticks> = notes.iter().map(|n| n.onset).collect();
    onsets.sort_unstable();
    onsets.windows(2).any(|w| w[0] == w[1])
}

fn any_cross_part_overlap(per_part_lines: &[Vec<NoteEvent>]) -> bool {
    for i in 0..per_part_lines.len() {
        for j in (i + 1)..per_part_lines.len() {
            if spans_overlap(&per_part_lines[i], &per_part_lines[j]) {
                return true;
            }
        }
    }
    false
}

fn spans_overlap(a: &[NoteEvent], b: &[NoteEvent]) -> bool {
    for na in a {
        if na.is_rest() {
            continue;
        }
        for nb in b {
            if nb.is_rest() {
                continue;
            }
            let a_start = na.onset;
            let a_end = na.onset + na.duration.max(1);
            let b_start = nb.onset;
            let b_end = nb.onset + nb.duration.max(1);
            if a_start < b_end && b_start < a_end {
                return true;
            }
        }
    }
    false
}

/// Splits polyphonic input into `k` melodic lines by assigning each
/// simultaneous note to the next line by descending pitch.
/// The topmost line becomes the primary melody (index 0).
fn split_polyphonic(per_part_lines: &[Vec<NoteEvent>]) -> (MelodicLine, Vec<MelodicLine>) {
    use std::collections::BTreeMap;

    let mut by_onset: BTreeMap<Ticks, Vec<NoteEvent>> = BTreeMap::new();
    for part in per_part_lines {
        for &note in part {
            by_onset.entry(note.onset).or_default().push(note);
        }
    }

    let line_count = by_onset.values().map(|v| v.len()).max().unwrap_or(1);
    let mut lines: Vec<MelodicLine> = (0..line_count).map(|_| MelodicLine::new()).collect();

    for (onset, mut notes_here) in by_onset {
        notes_here.sort_by(|a, b| b.pitch.cmp(&a.pitch));
        let min_duration = notes_here.iter().map(|n| n.duration).min().unwrap_or(0);
        for (rank, line) in lines.iter_mut().enumerate() {
            if let Some(note) = notes_here.get(rank) {
                line.push(*note);
            } else {
                line.push(NoteEvent { pitch: REST, duration: min_duration, onset });
            }
        }
    }

    let mut iter = lines.into_iter();
    let primary = iter.next().unwrap_or_default();
    (primary, iter.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?><score-partwise version="3.1">{body}</score-partwise>"#
        )
    }

    #[test]
    fn rejects_timewise_score() {
        let doc = "<?xml version=\"1.0\"?><score-timewise></score-timewise>";
        let err = read_score(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, HarmonizeError::UnsupportedFormat));
    }

    #[test]
    fn rejects_non_score_root() {
        let doc = "<?xml version=\"1.0\"?><not-a-score></not-a-score>";
        let err = read_score(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, HarmonizeError::InvalidFormat(_)));
    }

    #[test]
    fn rejects_missing_parts() {
        let doc = xml("<part-list></part-list>");
        let err = read_score(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, HarmonizeError::NoParts));
    }

    #[test]
    fn rejects_all_rest_melody() {
        let doc = xml(
            r#"<part id="P1"><measure number="1">
                <attributes><divisions>1</divisions></attributes>
                <note><rest/><duration>4</duration></note>
            </measure></part>"#,
        );
        let err = read_score(doc.as_bytes()).unwrap_err();
        assert!(matches!(err, HarmonizeError::EmptyMelody));
    }

    #[test]
    fn parses_single_note_c4() {
        let doc = xml(
            r#"<part id="P1"><measure number="1">
                <attributes>
                  <divisions>1</divisions>
                  <key><fifths>0</fifths></key>
                  <time><beats>4</beats><beat-type>4</beat-type></time>
                </attributes>
                <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
            </measure></part>"#,
        );
        let parsed = read_score(doc.as_bytes()).unwrap();
        assert_eq!(parsed.header.divisions, 1);
        assert_eq!(parsed.header.fifths, 0);
        assert_eq!(parsed.primary_melody.notes.len(), 1);
        assert_eq!(parsed.primary_melody.notes[0].pitch, 60);
        assert!(!parsed.is_polyphonic);
    }

    #[test]
    fn detects_polyphony_via_chord_flag() {
        let doc = xml(
            r#"<part id="P1"><measure number="1">
                <attributes><divisions>1</divisions></attributes>
                <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
                <note><chord/><pitch><step>E</step><octave>3</octave></pitch><duration>4</duration></note>
            </measure></part>"#,
        );
        let parsed = read_score(doc.as_bytes()).unwrap();
        assert!(parsed.is_polyphonic);
        assert_eq!(parsed.primary_melody.notes[0].pitch, 60); // C4 on top
        assert_eq!(parsed.other_lines[0].notes[0].pitch, 52); // E3 below
    }

    #[test]
    fn malformed_attributes_default() {
        let doc = xml(
            r#"<part id="P1"><measure number="1">
                <attributes>
                  <divisions>not-a-number</divisions>
                  <key><fifths>bogus</fifths></key>
                </attributes>
                <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
            </measure></part>"#,
        );
        let parsed = read_score(doc.as_bytes()).unwrap();
        assert_eq!(parsed.header.divisions, 1);
        assert_eq!(parsed.header.fifths, 0);
        assert_eq!(parsed.header.beats, 4);
        assert_eq!(parsed.header.beat_type, 4);
    }
}
