use crate::cli::{SelectArgs, SplitBy};
use crate::error::{CliError, Result};
use anmo::core::io::read_model;
use anmo::core::models::structure::Structure;
use anmo::core::selection::Selection;
use std::fmt::Write;
use tracing::info;

pub fn run(args: SelectArgs) -> Result<()> {
    let selection = Selection::parse(&args.selection)?;
    info!("Loading model from {:?}", &args.model);
    let model = read_model(&args.model).map_err(|e| CliError::FileParsing {
        path: args.model.clone(),
        source: e.into(),
    })?;
    let subset = selection.apply(&model)?;
    info!("Selected {} of {} atoms.", subset.len(), model.len());

    print!("{}", render(&subset, args.split_by)?);
    Ok(())
}

fn render(subset: &Structure, split_by: Option<SplitBy>) -> Result<String> {
    let groups: Vec<(String, Structure)> = match split_by {
        None => vec![(format!("{} atoms", subset.len()), subset.clone())],
        Some(SplitBy::Residue) => subset
            .split_by_residue()
            .into_iter()
            .map(|g| {
                let label = g
                    .atoms()
                    .first()
                    .map(|a| format!("Residue {} {}", a.resname, a.resid))
                    .unwrap_or_default();
                (label, g)
            })
            .collect(),
        Some(SplitBy::Name) => subset
            .split_by_name()
            .into_iter()
            .map(|(name, g)| (format!("Name {}", name), g))
            .collect(),
        Some(SplitBy::Molecule) => subset
            .split_by_molecule()?
            .into_iter()
            .enumerate()
            .map(|(i, g)| (format!("Molecule {}", i + 1), g))
            .collect(),
    };

    let mut out = String::new();
    for (label, group) in &groups {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "# {} ({} atoms)", label, group.len());
        for atom in group.atoms() {
            let p = atom.position;
            let _ = writeln!(
                out,
                "{:>6} {:>6} {:<4} {:<4} {:>5} {:>10.3} {:>10.3} {:>10.3}",
                atom.index, atom.serial, atom.name, atom.resname, atom.resid, p.x, p.y, p.z
            );
        }
    }
    Ok(out)
}
