//! A thin command-line front end over the library: read a binary- or SNBT-encoded NBT file,
//! print, write, merge, or path-query it. Argument parsing is hand-rolled rather than pulling in
//! a CLI framework, matching the minimal-dependency preference for small library-adjacent
//! binaries.

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{bail, Context, Result};
use nbtstack::{
    container::NbtFile,
    materialize, path::Path as NbtPath, scanner,
    settings::{Endianness, NbtCompression, SnbtParseOptions, SnbtWriteOptions},
    snbt,
    tag::{NbtCompound, NbtTag},
};

const STACK_DEPTH: usize = 512;

struct Options {
    target: PathBuf,
    read_binary: bool,
    write: Option<String>,
    merge: Option<String>,
    plain: bool,
    little: bool,
    compact: bool,
    pretty: bool,
    unpack: bool,
    json: bool,
    path_query: Option<String>,
    find_query: Option<String>,
}

fn parse_args() -> Result<Options> {
    let mut args = std::env::args().skip(1);
    let mut read_binary = None;
    let mut write = None;
    let mut merge = None;
    let mut plain = false;
    let mut little = false;
    let mut compact = false;
    let mut pretty = false;
    let mut unpack = false;
    let mut json = false;
    let mut path_query = None;
    let mut find_query = None;
    let mut target = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-r" => read_binary = Some(true),
            "-s" => read_binary = Some(false),
            "-w" => write = Some(args.next().context("-w requires an NBT argument")?),
            "-m" => merge = Some(args.next().context("-m requires an NBT argument")?),
            "--plain" => plain = true,
            "--little" => little = true,
            "--compact" => compact = true,
            "--pretty" => pretty = true,
            "--unpack" => unpack = true,
            "--json" => json = true,
            "--path" => path_query = Some(args.next().context("--path requires an expression")?),
            "--find" => find_query = Some(args.next().context("--find requires an expression")?),
            other if other.starts_with('-') => bail!("unrecognized flag '{other}'"),
            other => {
                if target.replace(PathBuf::from(other)).is_some() {
                    bail!("only one target file path may be given");
                }
            }
        }
    }

    if write.is_some() && merge.is_some() {
        bail!("-w and -m are mutually exclusive");
    }

    Ok(Options {
        target: target.context("missing target file path")?,
        read_binary: read_binary.context("exactly one of -r or -s is required")?,
        write,
        merge,
        plain,
        little,
        compact,
        pretty,
        unpack,
        json,
        path_query,
        find_query,
    })
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("nbt: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let opts = parse_args()?;
    let endianness = if opts.little { Endianness::LittleEndian } else { Endianness::BigEndian };

    let mut outer_name = String::new();
    let mut compression = if opts.plain { NbtCompression::Uncompressed } else { NbtCompression::GzipCompressed };

    let mut root: NbtCompound = if opts.read_binary {
        let bytes = fs::read(&opts.target).with_context(|| format!("reading {}", opts.target.display()))?;
        if opts.plain {
            let index = scanner::scan(&bytes, STACK_DEPTH, endianness)?;
            let (name, tag) = materialize::materialize_at(&bytes, &index, 0);
            outer_name = name;
            tag.as_compound().cloned().unwrap_or_default()
        } else {
            let file = NbtFile::decode(&bytes, endianness, STACK_DEPTH)?;
            outer_name = file.outer_name;
            compression = file.compression;
            file.root
        }
    } else {
        let text = fs::read_to_string(&opts.target).with_context(|| format!("reading {}", opts.target.display()))?;
        snbt::parse_compound(&text, SnbtParseOptions::default())?
    };

    if let Some(replacement) = &opts.write {
        let tag = snbt::parse_any(replacement, SnbtParseOptions::default())?;
        root = tag.as_compound().cloned().context("-w argument must be a compound")?;
        save(&opts, endianness, compression, &outer_name, &root)?;
        return Ok(());
    }

    if let Some(patch) = &opts.merge {
        let tag = snbt::parse_any(patch, SnbtParseOptions::default())?;
        let patch_compound = tag.as_compound().context("-m argument must be a compound")?;
        merge_into(&mut root, patch_compound);
        save(&opts, endianness, compression, &outer_name, &root)?;
        return Ok(());
    }

    let tag = NbtTag::Compound(root);
    let selected: Vec<NbtTag> = if let Some(expr) = &opts.path_query {
        NbtPath::parse(expr)?.get_all(&tag)
    } else if let Some(expr) = &opts.find_query {
        NbtPath::parse(expr)?.find(&tag).into_iter().collect()
    } else {
        vec![tag]
    };

    for value in &selected {
        println!("{}", render(value, &opts));
    }

    Ok(())
}

fn save(opts: &Options, endianness: Endianness, compression: NbtCompression, outer_name: &str, root: &NbtCompound) -> Result<()> {
    if opts.read_binary {
        let file = NbtFile { root: root.clone(), outer_name: outer_name.to_owned(), compression, byte_order: endianness };
        let bytes = file.encode(Default::default());
        fs::write(&opts.target, bytes).with_context(|| format!("writing {}", opts.target.display()))?;
    } else {
        let text = NbtTag::Compound(root.clone()).to_pretty_snbt("  ");
        fs::write(&opts.target, text).with_context(|| format!("writing {}", opts.target.display()))?;
    }
    Ok(())
}

/// Recursively replaces keys present in `patch` into `root`; nested compounds merge, every other
/// value (including lists and arrays) is replaced wholesale (§6 merge semantics).
fn merge_into(root: &mut NbtCompound, patch: &NbtCompound) {
    for (key, patch_value) in patch.iter() {
        match (root.get_mut(key), patch_value) {
            (Some(NbtTag::Compound(existing)), NbtTag::Compound(patch_compound)) => {
                merge_into(existing, patch_compound);
            }
            _ => {
                root.insert(key.clone(), patch_value.clone());
            }
        }
    }
}

fn render(tag: &NbtTag, opts: &Options) -> String {
    if opts.json {
        #[cfg(feature = "json")]
        {
            return nbtstack::json::to_json(tag).to_string();
        }
        #[cfg(not(feature = "json"))]
        {
            return "<built without the \"json\" feature>".to_owned();
        }
    }

    if opts.unpack {
        return unpacked(tag);
    }

    if opts.pretty {
        tag.to_pretty_snbt("  ")
    } else if opts.compact {
        tag.to_compact_snbt()
    } else {
        nbtstack::snbt::ser::to_snbt(tag, &SnbtWriteOptions::default())
    }
}

/// A plain textual rendering that drops numeric-suffix disambiguation, for `--unpack`: `5` rather
/// than `5b`, since the caller already knows the schema and just wants the value.
fn unpacked(tag: &NbtTag) -> String {
    match tag {
        NbtTag::Byte(v) => v.to_string(),
        NbtTag::Short(v) => v.to_string(),
        NbtTag::Int(v) => v.to_string(),
        NbtTag::Long(v) => v.to_string(),
        NbtTag::Float(v) => v.to_string(),
        NbtTag::Double(v) => v.to_string(),
        NbtTag::ByteArray(items) => format!("[{}]", items.iter().map(i8::to_string).collect::<Vec<_>>().join(", ")),
        NbtTag::IntArray(items) => format!("[{}]", items.iter().map(i32::to_string).collect::<Vec<_>>().join(", ")),
        NbtTag::LongArray(items) => format!("[{}]", items.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")),
        NbtTag::String(s) => s.clone(),
        NbtTag::List(list) => format!("[{}]", list.iter().map(unpacked).collect::<Vec<_>>().join(", ")),
        NbtTag::Compound(compound) => {
            let entries: Vec<String> = compound.iter().map(|(k, v)| format!("{k}: {}", unpacked(v))).collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
