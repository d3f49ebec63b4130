use clausemap_config::AnalysisConfig;

use crate::models::{Analysis, Block, NumberFormat};
use crate::numbering::{AbstractNum, LevelDef, NumberingDefinitions, apply_numbering};
use crate::parsing::{ParsedDocument, RawBlock};
use crate::pipeline::Pipeline;

/// Instance 1: `1.` / `1.1` / `1.1.1`
pub fn decimal_outline() -> NumberingDefinitions {
    let mut defs = NumberingDefinitions::default();
    defs.add_abstract(
        AbstractNum::new(1)
            .with_level(LevelDef::new(0, NumberFormat::Decimal, "%1."))
            .with_level(LevelDef::new(1, NumberFormat::Decimal, "%1.%2"))
            .with_level(LevelDef::new(2, NumberFormat::Decimal, "%1.%2.%3")),
    );
    defs.add_instance(1, 1);
    defs
}

/// Instance 2: `1.` / `(a)` / `(i)`
pub fn letter_clauses() -> NumberingDefinitions {
    let mut defs = NumberingDefinitions::default();
    defs.add_abstract(
        AbstractNum::new(2)
            .with_level(LevelDef::new(0, NumberFormat::Decimal, "%1."))
            .with_level(LevelDef::new(1, NumberFormat::LowerLetter, "(%2)"))
            .with_level(LevelDef::new(2, NumberFormat::LowerRoman, "(%3)")),
    );
    defs.add_instance(2, 2);
    defs
}

/// Number a raw stream without inferring hierarchy.
pub fn blocks_from(raw: Vec<RawBlock>, defs: &NumberingDefinitions) -> Vec<Block> {
    apply_numbering(raw, defs)
}

/// A three-level clause, a second clause with two continuation paragraphs.
pub fn sample_analysis() -> Analysis {
    let parsed = ParsedDocument {
        blocks: vec![
            RawBlock::paragraph("Definitions", "1A2B0001").numbered(1, 0),
            RawBlock::paragraph("Agreement", "1A2B0002").numbered(1, 1),
            RawBlock::paragraph("Each party agrees.", "1A2B0003").numbered(1, 2),
            RawBlock::paragraph("Payment", "1A2B0004").numbered(1, 0),
            RawBlock::paragraph("Invoices are due monthly.", "1A2B0005"),
            RawBlock::paragraph("Late fees apply.", "1A2B0006"),
        ],
        numbering: decimal_outline(),
        attachments: Vec::new(),
    };
    Pipeline::new(AnalysisConfig::default())
        .expect("default config is valid")
        .analyze_parsed("doc-sample", parsed)
}
