use clap::Parser;
use oscillator::Rgb;
use renderer::Antialiasing;

#[derive(Parser, Debug)]
#[command(
    name = "duofade",
    author,
    version,
    about = "Full-screen two-color fade oscillator rendered with a GPU shader"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Initial fade-in duration in milliseconds (ArrowUp/ArrowDown adjust it at runtime).
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 3000.0)]
    pub fade_in_ms: f64,

    /// Initial fade-out duration in milliseconds (ArrowRight/ArrowLeft adjust it at runtime).
    #[arg(long, value_name = "MILLISECONDS", default_value_t = 5000.0)]
    pub fade_out_ms: f64,

    /// Color shown while fading in, as `R,G,B` with components in 0..=1.
    #[arg(long, value_name = "R,G,B", default_value = "1,1,1", value_parser = parse_color)]
    pub color1: Rgb,

    /// Color shown while fading out, as `R,G,B` with components in 0..=1.
    #[arg(long, value_name = "R,G,B", default_value = "0,0,0", value_parser = parse_color)]
    pub color2: Rgb,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_antialias,
        default_value = "auto"
    )]
    pub antialias: Antialiasing,
}

#[derive(Debug, thiserror::Error)]
pub enum ArgParseError {
    #[error("expected `R,G,B` with three components, got `{0}`")]
    ColorShape(String),
    #[error("color component `{0}` is not a number in 0..=1")]
    ColorComponent(String),
    #[error("expected `WIDTHxHEIGHT` with positive integers, got `{0}`")]
    SurfaceSize(String),
    #[error("expected `auto`, `off`, or a sample count, got `{0}`")]
    Antialias(String),
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_color(value: &str) -> Result<Rgb, ArgParseError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ArgParseError::ColorShape(value.to_string()));
    }

    let mut color = [0.0f32; 3];
    for (slot, part) in color.iter_mut().zip(&parts) {
        let component: f32 = part
            .parse()
            .map_err(|_| ArgParseError::ColorComponent(part.to_string()))?;
        if !(0.0..=1.0).contains(&component) {
            return Err(ArgParseError::ColorComponent(part.to_string()));
        }
        *slot = component;
    }
    Ok(color)
}

fn parse_surface_size(value: &str) -> Result<(u32, u32), ArgParseError> {
    let invalid = || ArgParseError::SurfaceSize(value.to_string());
    let (width, height) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

fn parse_antialias(value: &str) -> Result<Antialiasing, ArgParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "auto" => Ok(Antialiasing::Auto),
        "off" | "none" | "1" => Ok(Antialiasing::Off),
        other => {
            let samples: u32 = other
                .parse()
                .map_err(|_| ArgParseError::Antialias(value.to_string()))?;
            if samples < 2 || !samples.is_power_of_two() {
                return Err(ArgParseError::Antialias(value.to_string()));
            }
            Ok(Antialiasing::Samples(samples))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_color_triples() {
        assert_eq!(parse_color("1,1,1").unwrap(), [1.0, 1.0, 1.0]);
        assert_eq!(parse_color("0.2, 0.4, 0.6").unwrap(), [0.2, 0.4, 0.6]);
        assert!(parse_color("1,1").is_err());
        assert!(parse_color("1,1,2").is_err());
        assert!(parse_color("red,0,0").is_err());
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size("1920X1080").unwrap(), (1920, 1080));
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("axb").is_err());
    }

    #[test]
    fn parses_antialias_modes() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias("off").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("4").unwrap(), Antialiasing::Samples(4));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("fancy").is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["duofade"]);
        assert_eq!(cli.run.fade_in_ms, 3000.0);
        assert_eq!(cli.run.fade_out_ms, 5000.0);
        assert_eq!(cli.run.color1, [1.0, 1.0, 1.0]);
        assert_eq!(cli.run.color2, [0.0, 0.0, 0.0]);
        assert_eq!(cli.run.antialias, Antialiasing::Auto);
    }
}
