//! Score Writer.
//!
//! Emits partwise score-exchange XML by hand, string-builder style, rather
//! than through a generic XML writer crate -- the output is a small, fixed
//! shape (one measure per part) and a direct builder keeps the document's
//! structure legible line-by-line.

use crate::instruments::ClefSign;
use crate::key::Key;
use crate::note::{MelodicLine, NoteEvent};
use crate::part_extractor::InstrumentPart;
use crate::pitch::{is_rest, spell};

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const DOCTYPE: &str = "<!DOCTYPE score-partwise PUBLIC \"-//Recordare//DTD MusicXML 3.1 Partwise//EN\" \"http://www.musicxml.org/dtds/partwise.dtd\">\n";

/// One emitted part: an id/name pair and the note events to serialize.
struct PartSpec<'a> {
    id: String,
    name: String,
    clef: Option<(ClefSign, u8)>,
    notes: &'a [NoteEvent],
}

/// Emit the harmony-only document: one part per instrument, in request order.
pub fn write_harmony_only(
    parts: &[InstrumentPart],
    key: &Key,
    divisions: u32,
    beats: u32,
    beat_type: u32,
) -> String {
    let specs: Vec<PartSpec> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| PartSpec {
            id: format!("P{}", i + 1),
            name: part.instrument.name.to_string(),
            clef: Some((part.instrument.clef_sign, part.instrument.clef_line)),
            notes: &part.notes,
        })
        .collect();
    emit_document(&specs, key, divisions, beats, beat_type)
}

/// Emit the combined document for a monophonic melody: the original melody
/// part first, then one part per instrument.
pub fn write_combined_monophonic(
    melody: &MelodicLine,
    melody_part_name: &str,
    parts: &[InstrumentPart],
    key: &Key,
    divisions: u32,
    beats: u32,
    beat_type: u32,
) -> String {
    let mut specs = Vec::with_capacity(parts.len() + 1);
    specs.push(PartSpec {
        id: "P1".to_string(),
        name: melody_part_name.to_string(),
        clef: None,
        notes: &melody.notes,
    });
    for (i, part) in parts.iter().enumerate() {
        specs.push(PartSpec {
            id: format!("P{}", i + 2),
            name: part.instrument.name.to_string(),
            clef: Some((part.instrument.clef_sign, part.instrument.clef_line)),
            notes: &part.notes,
        });
    }
    emit_document(&specs, key, divisions, beats, beat_type)
}

/// Emit the combined document for a polyphonic melody: one `Voice k` part
/// per detected melodic line, then one part per instrument.
pub fn write_combined_polyphonic(
    lines: &[MelodicLine],
    parts: &[InstrumentPart],
    key: &Key,
    divisions: u32,
    beats: u32,
    beat_type: u32,
) -> String {
    let mut specs = Vec::with_capacity(lines.len() + parts.len());
    for (i, line) in lines.iter().enumerate() {
        specs.push(PartSpec {
            id: format!("P{}", i + 1),
            name: format!("Voice {}", i + 1),
            clef: None,
            notes: &line.notes,
        });
    }
    let offset = lines.len();
    for (i, part) in parts.iter().enumerate() {
        specs.push(PartSpec {
            id: format!("P{}", offset + i + 1),
            name: part.instrument.name.to_string(),
            clef: Some((part.instrument.clef_sign, part.instrument.clef_line)),
            notes: &part.notes,
        });
    }
    emit_document(&specs, key, divisions, beats, beat_type)
}

fn emit_document(specs: &[PartSpec], key: &Key, divisions: u32, beats: u32, beat_type: u32) -> String {
    let mut xml = String::new();
    xml.push_str(XML_HEADER);
    xml.push_str(DOCTYPE);
    xml.push_str("<score-partwise version=\"3.1\">\n");

    xml.push_str("  <part-list>\n");
    for spec in specs {
        xml.push_str(&format!("    <score-part id=\"{}\">\n", spec.id));
        xml.push_str(&format!("      <part-name>{}</part-name>\n", xml_escape(&spec.name)));
        xml.push_str("    </score-part>\n");
    }
    xml.push_str("  </part-list>\n");

    for spec in specs {
        xml.push_str(&format!("  <part id=\"{}\">\n", spec.id));
        xml.push_str("    <measure number=\"1\">\n");
        write_attributes(&mut xml, key, divisions, beats, beat_type, spec.clef);
        for note in spec.notes {
            write_note(&mut xml, note, key);
        }
        xml.push_str("    </measure>\n");
        xml.push_str("  </part>\n");
    }

    xml.push_str("</score-partwise>\n");
    xml
}

fn write_attributes(
    xml: &mut String,
    key: &Key,
    divisions: u32,
    beats: u32,
    beat_type: u32,
    clef: Option<(ClefSign, u8)>,
) {
    xml.push_str("      <attributes>\n");
    xml.push_str(&format!("        <divisions>{}</divisions>\n", divisions));
    xml.push_str("        <key>\n");
    xml.push_str(&format!("          <fifths>{}</fifths>\n", key.fifths));
    xml.push_str("        </key>\n");
    xml.push_str("        <time>\n");
    xml.push_str(&format!("          <beats>{}</beats>\n", beats));
    xml.push_str(&format!("          <beat-type>{}</beat-type>\n", beat_type));
    xml.push_str("        </time>\n");
    if let Some((sign, line)) = clef {
        xml.push_str("        <clef>\n");
        xml.push_str(&format!("          <sign>{}</sign>\n", sign.as_str()));
        xml.push_str(&format!("          <line>{}</line>\n", line));
        xml.push_str("        </clef>\n");
    }
    xml.push_str("      </attributes>\n");
}

fn write_note(xml: &mut String, note: &NoteEvent, key: &Key) {
    xml.push_str("      <note>\n");
    if is_rest(note.pitch) {
        xml.push_str("        <rest/>\n");
    } else {
        let spelled = spell(note.pitch, key);
        xml.push_str("        <pitch>\n");
        xml.push_str(&format!("          <step>{}</step>\n", spelled.step_name()));
        if spelled.alter != 0 {
            xml.push_str(&format!("          <alter>{}</alter>\n", spelled.alter));
        }
        xml.push_str(&format!("          <octave>{}</octave>\n", spelled.octave));
        xml.push_str("        </pitch>\n");
    }
    xml.push_str(&format!("        <duration>{}</duration>\n", note.duration));
    xml.push_str("      </note>\n");
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments;
    use crate::key::Mode;
    use crate::pitch::REST;

    #[test]
    fn harmony_only_emits_one_part_per_instrument() {
        let key = Key::from_fifths(0, Mode::Major);
        let violin = instruments::resolve("Violin");
        let notes = vec![NoteEvent { pitch: 67, duration: 4, onset: 0 }];
        let parts = vec![InstrumentPart { instrument: violin, notes }];
        let xml = write_harmony_only(&parts, &key, 4, 4, 4);
        assert!(xml.contains("<score-partwise version=\"3.1\">"));
        assert!(xml.contains(&DOCTYPE.trim_end().to_string()));
        assert!(xml.contains("<part-name>Violin</part-name>"));
        assert!(xml.contains("<step>G</step>"));
    }

    #[test]
    fn rest_emits_rest_element_not_pitch() {
        let key = Key::from_fifths(0, Mode::Major);
        let violin = instruments::resolve("Violin");
        let notes = vec![NoteEvent { pitch: REST, duration: 4, onset: 0 }];
        let parts = vec![InstrumentPart { instrument: violin, notes }];
        let xml = write_harmony_only(&parts, &key, 4, 4, 4);
        assert!(xml.contains("<rest/>"));
        assert!(!xml.contains("<pitch>"));
    }

    #[test]
    fn combined_monophonic_puts_melody_part_first() {
        let key = Key::from_fifths(0, Mode::Major);
        let mut melody = MelodicLine::new();
        melody.push(NoteEvent { pitch: 60, duration: 4, onset: 0 });
        let violin = instruments::resolve("Violin");
        let parts = vec![InstrumentPart {
            instrument: violin,
            notes: vec![NoteEvent { pitch: 64, duration: 4, onset: 0 }],
        }];
        let xml = write_combined_monophonic(&melody, "Melody", &parts, &key, 4, 4, 4);
        let melody_pos = xml.find("<part-name>Melody</part-name>").unwrap();
        let violin_pos = xml.find("<part-name>Violin</part-name>").unwrap();
        assert!(melody_pos < violin_pos);
    }
}
