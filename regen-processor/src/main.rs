use anyhow::{Context, Result, bail};
use regen_engine::TopologyEngine;
use regen_tokenizer::{DatasetConfig, RawMesh, build_dataset};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const USAGE: &str =
    "Usage: regen-processor <input_dir> <output.bin> [--num-pos-tokens N] [--no-validation]";

fn parse_args(args: &[String]) -> Result<(PathBuf, PathBuf, DatasetConfig)> {
    let mut config = DatasetConfig::default();
    let mut paths = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--num-pos-tokens" => {
                let value = iter.next().context("--num-pos-tokens needs a value")?;
                config.num_pos_tokens = value
                    .parse()
                    .with_context(|| format!("Invalid --num-pos-tokens: {}", value))?;
            }
            "--no-validation" => config.validate = false,
            "--validate-collapse" => config.validate_collapse = true,
            flag if flag.starts_with("--") => bail!("Unknown flag {}", flag),
            path => paths.push(PathBuf::from(path)),
        }
    }

    match <[PathBuf; 2]>::try_from(paths) {
        Ok([input, output]) => Ok((input, output, config)),
        Err(_) => bail!("{}", USAGE),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("{}", USAGE);
        return Ok(());
    }
    let (input_dir, output_path, config) = parse_args(&args)?;

    let start_total = Instant::now();
    let raws = load_obj_dir(&input_dir)?;
    log::info!(
        "Loaded and welded {} meshes in {:.2}s",
        raws.len(),
        start_total.elapsed().as_secs_f32()
    );

    let build_start = Instant::now();
    let engine = TopologyEngine::new();
    let rows = build_dataset(&raws, &engine, &config);
    log::info!("Dataset build complete in {:.2}s", build_start.elapsed().as_secs_f32());

    let save_start = Instant::now();
    let file = File::create(&output_path)
        .with_context(|| format!("Failed to create output file: {:?}", output_path))?;
    let mut writer = BufWriter::new(file);
    let encoded = bincode::serialize(&rows).context("Failed to serialize dataset")?;
    writer.write_all(&encoded).context("Failed to write dataset")?;
    writer.flush()?;
    log::info!(
        "Saved {} rows to {:?} ({:.2} MB) in {:.2}s",
        rows.len(),
        output_path,
        encoded.len() as f64 / 1024.0 / 1024.0,
        save_start.elapsed().as_secs_f32()
    );
    log::info!("Total execution time: {:.2}s", start_total.elapsed().as_secs_f32());

    Ok(())
}

fn load_obj_dir(dir: &Path) -> Result<Vec<RawMesh>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory: {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("obj")))
        .collect();
    paths.sort();

    let mut raws = Vec::with_capacity(paths.len());
    for path in paths {
        match load_obj(&path) {
            Ok(raw) => raws.push(raw),
            Err(e) => log::warn!("Skipping {:?}: {:#}", path, e),
        }
    }
    Ok(raws)
}

fn load_obj(path: &Path) -> Result<RawMesh> {
    let (models, _materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
        .with_context(|| format!("Failed to load OBJ file: {:?}", path))?;

    let mut raw_positions = Vec::new();
    let mut raw_indices = Vec::new();
    let mut index_offset = 0;
    for model in models {
        let mesh = &model.mesh;
        raw_positions.extend_from_slice(&mesh.positions);
        raw_indices.extend(mesh.indices.iter().map(|&i| i + index_offset));
        index_offset += (mesh.positions.len() / 3) as u32;
    }
    if raw_indices.is_empty() {
        bail!("OBJ file has no triangles");
    }

    // Weld on position only; normals and uvs split vertices in GPU layout.
    use meshopt::{generate_vertex_remap, remap_index_buffer, remap_vertex_buffer};

    #[repr(C)]
    #[derive(Clone, Copy, PartialEq, Default)]
    struct Point {
        p: [f32; 3],
    }

    let points: Vec<Point> = raw_positions
        .chunks_exact(3)
        .map(|c| Point { p: [c[0], c[1], c[2]] })
        .collect();
    let (vertex_count, remap) = generate_vertex_remap(&points, Some(&raw_indices));
    let welded = remap_vertex_buffer(&points, vertex_count, &remap);
    let indices = remap_index_buffer(Some(&raw_indices), vertex_count, &remap);

    let uid = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(RawMesh {
        uid,
        vertices: welded
            .iter()
            .map(|v| [v.p[0] as f64, v.p[1] as f64, v.p[2] as f64])
            .collect(),
        faces: indices.chunks_exact(3).map(|f| [f[0], f[1], f[2]]).collect(),
    })
}
