use crate::error::Result;
use anmo::core::enm::springs::{Spring, spring_names};

/// Lists every spring function with its default descriptor.
pub fn run() -> Result<()> {
    print!("{}", render()?);
    Ok(())
}

fn render() -> Result<String> {
    let mut out = String::from("Available spring functions (name,defaults):\n");
    for name in spring_names() {
        let spring = Spring::lookup(name, &[]).map_err(anyhow::Error::from)?;
        out.push_str(&format!("  {:<16} {}\n", name, spring));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_spring_is_listed_with_its_defaults() {
        let out = render().unwrap();
        assert_eq!(out.lines().count(), spring_names().len() + 1);
        assert!(out.contains("distance,15\n"));
        assert!(out.contains("constant,1\n"));
        assert!(out.contains("hca,4,205.5,571.2,305900,6\n"));
    }

    #[test]
    fn listed_descriptors_parse_back() {
        for line in render().unwrap().lines().skip(1) {
            let descriptor = line.split_whitespace().last().unwrap();
            assert!(descriptor.parse::<Spring>().is_ok(), "{descriptor}");
        }
    }
}
