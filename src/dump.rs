//! Tree dump of a parsed DTD
//!
//! Renders the recorded atoms one node per line. The document and every
//! expanded parameter entity become `<e name="...">` ... `</e>` nodes, and
//! each literal token becomes a `<t>...</t>` leaf:
//!
//! ```text
//! <e name="#doc">
//! <t>&lt;!ELEMENT</t>
//! <t> </t>
//! <t>e</t>
//! <t> </t>
//! <t>(</t>
//! <e name="q">
//! <t>foobar</t>
//! </e>
//! <t>)</t>
//! <t>&gt;</t>
//! </e>
//! ```

use crate::core::dtd::{Atom, EntityTable};
use crate::core::entities::escape_text;
use crate::parser::ParsedDtd;

/// Dump the whole document
pub fn dump_document(dtd: &ParsedDtd) -> String {
    let mut out = String::new();
    dump_entity(&mut out, dtd.entities(), ParsedDtd::DOCUMENT_NAME, dtd.atoms());
    out
}

/// Dump one named node and, recursively, the expansions it refers to
pub fn dump_entity(out: &mut String, table: &EntityTable, name: &str, atoms: &[Atom]) {
    out.push_str(&format!("<e name=\"{}\">\n", escape_text(name)));
    for atom in atoms {
        match atom {
            Atom::Literal { text, .. } => {
                out.push_str(&format!("<t>{}</t>\n", escape_text(text)));
            }
            Atom::Reference { entity, expansion } => {
                let entity = table.get(*entity);
                let atoms = entity.expansion(*expansion).unwrap_or(&[]);
                dump_entity(out, table, entity.name(), atoms);
            }
        }
    }
    out.push_str("</e>\n");
}

#[cfg(test)]
mod tests {
    use crate::parse_dtd;

    #[test]
    fn test_dump_nested_entities() {
        let dtd = parse_dtd(b"<!ENTITY % p 'a'><!ELEMENT e (%p;)>").unwrap();
        let dump = dtd.dump();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines.first(), Some(&"<e name=\"#doc\">"));
        assert_eq!(lines.last(), Some(&"</e>"));
        assert!(dump.contains("<t>&lt;!ENTITY</t>\n"));
        assert!(dump.contains("<t>(</t>\n<e name=\"p\">\n<t>a</t>\n</e>\n<t>)</t>\n"));
        assert!(dump.contains("<t>&gt;</t>\n"));
    }

    #[test]
    fn test_dump_escapes_text() {
        let dtd = parse_dtd(b"<!ENTITY % p '&amp;<x>'>").unwrap();
        assert!(dtd.dump().contains("<t>'&amp;amp;&lt;x&gt;'</t>"));
    }
}
