use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use regen_core::quantize::quantize_mesh;
use regen_core::{
    canonicalize, CollapseConfig, CollapseEngine, Face, Mesh, Position, RegenError, RegenResult,
    SplitEngine, SplitPositions, VertexSplitOp,
};

use crate::decoder::Decoder;
use crate::recorder::record_quantized;

/// Control token ids and the offset that lifts coordinates above them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub bos: u32,
    pub eos: u32,
    pub sep: u32,
    pub nil: u32,
    pub pos_offset: u32,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            bos: 1,
            eos: 2,
            sep: 3,
            nil: 4,
            pos_offset: 5,
        }
    }
}

impl TokenizerConfig {
    /// Control ids must be distinct and sit below `pos_offset`.
    pub fn validate(&self) -> RegenResult<()> {
        let controls = [("bos", self.bos), ("eos", self.eos), ("sep", self.sep), ("nil", self.nil)];
        for (i, &(name, id)) in controls.iter().enumerate() {
            if id >= self.pos_offset {
                return Err(RegenError::InvalidConfig(format!(
                    "{} token {} overlaps the position range starting at {}",
                    name, id, self.pos_offset
                )));
            }
            if let Some(&(other, _)) = controls[..i].iter().find(|&&(_, o)| o == id) {
                return Err(RegenError::InvalidConfig(format!(
                    "{} and {} share token id {}",
                    other, name, id
                )));
            }
        }
        Ok(())
    }
}

fn push_position(tokens: &mut Vec<u32>, p: &Position, offset: u32) -> RegenResult<()> {
    for &c in p {
        let token = c.checked_add(offset).ok_or_else(|| {
            RegenError::InvalidMesh(format!("coordinate {} does not fit a token", c))
        })?;
        tokens.push(token);
    }
    Ok(())
}

/// `BOS soup SEP splits EOS`
///
/// The soup is the canonical base mesh flattened per face, per vertex, per
/// axis; each split is `v_s v_l|NIL v_r|NIL v_t` with positions taken from
/// `all_vertices`.
pub fn tokenize(
    all_vertices: &[Position],
    base: &Mesh,
    splits: &[VertexSplitOp],
    config: &TokenizerConfig,
) -> RegenResult<Vec<u32>> {
    config.validate()?;
    base.validate()?;
    let base = canonicalize(base);
    let offset = config.pos_offset;

    let mut tokens = Vec::with_capacity(2 + base.face_count() * 9 + 1 + splits.len() * 12);
    tokens.push(config.bos);
    for corner in base.polygon_soup().iter().flatten() {
        push_position(&mut tokens, corner, offset)?;
    }

    tokens.push(config.sep);
    for op in splits {
        let p = op.positions(all_vertices)?;
        push_position(&mut tokens, &p.v_s, offset)?;
        for link in [p.v_l, p.v_r] {
            match link {
                Some(q) => push_position(&mut tokens, &q, offset)?,
                None => tokens.push(config.nil),
            }
        }
        push_position(&mut tokens, &p.v_t, offset)?;
    }
    tokens.push(config.eos);
    Ok(tokens)
}

/// Raw mesh straight to tokens: quantize, record, tokenize.
pub fn tokenize_mesh<E>(
    vertices: &[[f64; 3]],
    faces: &[Face],
    num_pos_tokens: u32,
    engine: &E,
    collapse: &CollapseConfig,
    config: &TokenizerConfig,
) -> RegenResult<Vec<u32>>
where
    E: CollapseEngine + ?Sized,
{
    let mesh = quantize_mesh(vertices, faces, num_pos_tokens)?;
    let result = record_quantized(&mesh, engine, collapse)?;
    tokenize(&result.full.vertices, &result.base, &result.splits, config)
}

/// A token stream split back into its base mesh and split operations.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenizedMesh {
    pub base: Mesh,
    pub splits: Vec<SplitPositions>,
}

struct TokenReader<'a> {
    tokens: &'a [u32],
    cursor: usize,
    config: &'a TokenizerConfig,
}

impl TokenReader<'_> {
    fn malformed(&self, msg: &str) -> RegenError {
        RegenError::MalformedTokens(format!("{} at token {}", msg, self.cursor))
    }

    fn peek(&self) -> Option<u32> {
        self.tokens.get(self.cursor).copied()
    }

    fn position(&mut self) -> RegenResult<Position> {
        let mut p = [0u32; 3];
        for c in p.iter_mut() {
            let token = self.peek().ok_or_else(|| self.malformed("stream ends inside a position"))?;
            if token < self.config.pos_offset {
                return Err(self.malformed("expected a position token"));
            }
            *c = token - self.config.pos_offset;
            self.cursor += 1;
        }
        Ok(p)
    }

    fn link(&mut self) -> RegenResult<Option<Position>> {
        if self.peek() == Some(self.config.nil) {
            self.cursor += 1;
            return Ok(None);
        }
        self.position().map(Some)
    }
}

/// Inverse of the stream layout produced by [`tokenize`].
///
/// Base vertices are welded by exact position in order of first appearance.
pub fn parse_tokens(tokens: &[u32], config: &TokenizerConfig) -> RegenResult<TokenizedMesh> {
    config.validate()?;
    let mut reader = TokenReader { tokens, cursor: 0, config };

    if reader.peek() != Some(config.bos) {
        return Err(reader.malformed("missing BOS"));
    }
    reader.cursor += 1;

    let mut base = Mesh::default();
    let mut index_of: HashMap<Position, u32> = HashMap::new();
    while reader.peek() != Some(config.sep) {
        if reader.peek().is_none() {
            return Err(reader.malformed("missing SEP"));
        }
        let mut face = [0u32; 3];
        for corner in face.iter_mut() {
            let p = reader.position()?;
            *corner = *index_of.entry(p).or_insert_with(|| {
                base.vertices.push(p);
                (base.vertices.len() - 1) as u32
            });
        }
        base.faces.push(face);
    }
    reader.cursor += 1;

    let mut splits = Vec::new();
    while reader.peek() != Some(config.eos) {
        if reader.peek().is_none() {
            return Err(reader.malformed("missing EOS"));
        }
        let v_s = reader.position()?;
        let v_l = reader.link()?;
        let v_r = reader.link()?;
        let v_t = reader.position()?;
        splits.push(SplitPositions { v_s, v_l, v_r, v_t });
    }
    reader.cursor += 1;

    if reader.cursor != tokens.len() {
        return Err(reader.malformed("trailing tokens after EOS"));
    }
    Ok(TokenizedMesh { base, splits })
}

/// Parses a token stream and replays its splits on the decoded base mesh.
pub fn detokenize<E>(tokens: &[u32], config: &TokenizerConfig, engine: &E) -> RegenResult<Mesh>
where
    E: SplitEngine + ?Sized,
{
    let TokenizedMesh { base, splits } = parse_tokens(tokens, config)?;
    let mut decoder = Decoder::new(engine, base);
    for (step, op) in splits.iter().enumerate() {
        if let Err(e) = decoder.try_apply(op) {
            log::debug!("split {} of {} rejected: {}", step, splits.len(), e);
            return Err(RegenError::SplitRejected { step });
        }
    }
    Ok(decoder.into_mesh())
}
