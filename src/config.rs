use std::path::PathBuf;

use anyhow::{bail, Context};

use crate::sequencer::scale::Scale;

pub const USAGE: &str = "usage: melodygrid [LINK_OR_TOKEN] [--scale NAME] [--tempo BPM] \
[--instrument NAME] [--share-base URL] [--bounce OUT.wav [--cycles N]] [--log PATH]";

/// Launch options. Everything is optional; an empty command line opens a
/// blank grid at the defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaunchConfig {
    pub melody: Option<String>, // share link or bare token
    pub scale: Option<Scale>,
    pub tempo: Option<u32>,
    pub instrument: Option<String>, // checked later so a typo only warns
    pub share_base: Option<String>,
    pub bounce: Option<PathBuf>,
    pub cycles: usize,
    pub log: Option<PathBuf>,
}

impl LaunchConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = LaunchConfig { cycles: 1, ..Default::default() };
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--scale" => {
                    let name = value(&mut args, &arg)?;
                    config.scale = Some(name.parse()?);
                }
                "--tempo" => {
                    let raw = value(&mut args, &arg)?;
                    let tempo: u32 = raw.parse().with_context(|| format!("bad tempo {raw:?}"))?;
                    if tempo == 0 {
                        bail!("tempo must be positive");
                    }
                    config.tempo = Some(tempo);
                }
                "--instrument" => config.instrument = Some(value(&mut args, &arg)?),
                "--share-base" => config.share_base = Some(value(&mut args, &arg)?),
                "--bounce" => config.bounce = Some(PathBuf::from(value(&mut args, &arg)?)),
                "--cycles" => {
                    let raw = value(&mut args, &arg)?;
                    config.cycles = raw.parse().with_context(|| format!("bad cycle count {raw:?}"))?;
                    if config.cycles == 0 {
                        bail!("cycles must be at least 1");
                    }
                }
                "--log" => config.log = Some(PathBuf::from(value(&mut args, &arg)?)),
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
                _ => {
                    if config.melody.is_some() {
                        bail!("only one melody link can be given\n{USAGE}");
                    }
                    config.melody = Some(arg);
                }
            }
        }
        Ok(config)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("melodygrid.log"))
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next().with_context(|| format!("{flag} needs a value"))
}
