use regen_core::{Mesh, Position, PositionMap, RegenError, RegenResult, SplitEngine, SplitPositions};

/// Replays position-addressed vertex splits on top of a base mesh.
pub struct Decoder<'e, E: SplitEngine + ?Sized> {
    engine: &'e E,
    mesh: Mesh,
    positions: PositionMap,
    applied: usize,
}

impl<'e, E: SplitEngine + ?Sized> Decoder<'e, E> {
    pub fn new(engine: &'e E, base: Mesh) -> Self {
        let positions = base.position_map();
        Self {
            engine,
            mesh: base,
            positions,
            applied: 0,
        }
    }

    /// Number of splits applied so far.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    fn lookup(&self, what: &str, p: &Position) -> RegenResult<u32> {
        self.positions.get(p).ok_or_else(|| RegenError::Resolution {
            step: self.applied,
            what: format!("{} {:?} is not in the current mesh", what, p),
        })
    }

    /// Like [`Decoder::apply`] but reports why a split was refused.
    pub fn try_apply(&mut self, op: &SplitPositions) -> RegenResult<()> {
        if op.v_l.is_none() && op.v_r.is_none() {
            return Err(RegenError::Engine("split has no link vertex".into()));
        }
        if self.positions.contains(&op.v_t) {
            return Err(RegenError::Engine(format!(
                "v_t {:?} already exists",
                op.v_t
            )));
        }
        let v_s = self.lookup("v_s", &op.v_s)?;
        let v_l = op.v_l.map(|p| self.lookup("v_l", &p)).transpose()?;
        let v_r = op.v_r.map(|p| self.lookup("v_r", &p)).transpose()?;

        let mesh = self.engine.split(&self.mesh, v_s, v_l, v_r, op.v_t)?;
        self.positions = mesh.position_map();
        self.mesh = mesh;
        self.applied += 1;
        Ok(())
    }

    /// Applies one split. On `false` the decoder state is unchanged.
    pub fn apply(&mut self, op: &SplitPositions) -> bool {
        match self.try_apply(op) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("vertex split refused: {}", e);
                false
            }
        }
    }
}
