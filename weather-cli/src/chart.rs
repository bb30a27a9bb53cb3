//! Horizontal bar chart of per-city temperatures for the terminal.

use weather_core::{CityOutcome, WeatherReading};

const BAR_WIDTH: usize = 40;

pub struct Bar<'a> {
    pub label: &'a str,
    pub temperature_f: f64,
    pub condition: &'a str,
}

/// Bars for every city that produced a reading, in run order.
pub fn bars(outcomes: &[CityOutcome]) -> Vec<Bar<'_>> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.status.reading().map(|r: &WeatherReading| Bar {
                label: o.city.as_str(),
                temperature_f: r.temperature_f,
                condition: r.condition_text.as_str(),
            })
        })
        .collect()
}

/// Bars are scaled to the largest absolute temperature. Sub-zero readings
/// use a lighter glyph.
pub fn render(bars: &[Bar<'_>]) -> String {
    if bars.is_empty() {
        return String::new();
    }

    let label_width = bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
    let max_abs = bars.iter().map(|b| b.temperature_f.abs()).fold(0.0_f64, f64::max);

    let mut out = String::from("Temperature by city (°F)\n");
    for bar in bars {
        let len = if max_abs > 0.0 {
            ((bar.temperature_f.abs() / max_abs) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let glyph = if bar.temperature_f < 0.0 { "░" } else { "█" };

        out.push_str(&format!(
            "{:<label_width$} | {:<BAR_WIDTH$} {:>6.1}°F  {}\n",
            bar.label,
            glyph.repeat(len),
            bar.temperature_f,
            bar.condition,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar<'a>(label: &'a str, t: f64, condition: &'a str) -> Bar<'a> {
        Bar { label, temperature_f: t, condition }
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn hottest_city_gets_full_width_bar() {
        let out = render(&[bar("Philadelphia", 80.0, "clear sky"), bar("Seattle", 40.0, "rain")]);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].matches('█').count(), BAR_WIDTH);
        assert_eq!(lines[2].matches('█').count(), BAR_WIDTH / 2);
        assert!(lines[1].contains("80.0°F"));
        assert!(lines[2].ends_with("rain"));
    }

    #[test]
    fn labels_are_aligned() {
        let out = render(&[bar("Oslo", 10.0, "fog"), bar("New York", 20.0, "haze")]);
        let pipes: Vec<usize> = out.lines().skip(1).map(|l| l.find('|').unwrap()).collect();
        assert_eq!(pipes[0], pipes[1]);
    }

    #[test]
    fn negative_and_zero_temperatures() {
        let out = render(&[bar("Yakutsk", -40.0, "snow"), bar("Reykjavik", 0.0, "cloudy")]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1].matches('░').count(), BAR_WIDTH);
        assert_eq!(lines[2].matches('█').count(), 0);

        let out = render(&[bar("Nowhere", 0.0, "calm")]);
        assert!(out.contains("0.0°F"));
    }
}
