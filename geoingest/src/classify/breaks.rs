//! Calcul des bornes de classes : intervalles égaux, quantiles, seuils
//! naturels (Jenks)

/// Au-delà, l'entrée de Jenks est sous-échantillonnée
pub const JENKS_MAX_SAMPLE: usize = 4000;

/// Précision d'affichage des bornes (décimales)
const BREAK_DECIMALS: i32 = 2;

/// `classes + 1` bornes régulièrement espacées entre min et max
pub fn equal_interval(sorted: &[f64], classes: usize) -> Vec<f64> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let step = (max - min) / classes as f64;
    let mut breaks: Vec<f64> = (0..classes).map(|i| min + step * i as f64).collect();
    breaks.push(max);
    breaks
}

/// Bornes aux quantiles `i / classes` (interpolation linéaire)
pub fn quantile(sorted: &[f64], classes: usize) -> Vec<f64> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let last = (sorted.len() - 1) as f64;

    let mut breaks = Vec::with_capacity(classes + 1);
    breaks.push(min);
    for i in 1..classes {
        let pos = last * i as f64 / classes as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let frac = pos - lo as f64;
        breaks.push(sorted[lo] + (sorted[hi] - sorted[lo]) * frac);
    }
    breaks.push(max);
    breaks
}

/// Seuils naturels de Jenks (minimisation de la variance intra-classe).
///
/// Avec moins de valeurs que de classes, retombe sur les intervalles égaux.
pub fn natural_breaks(sorted: &[f64], classes: usize) -> Vec<f64> {
    if sorted.len() <= classes {
        return equal_interval(sorted, classes);
    }
    let sample = downsample(sorted, JENKS_MAX_SAMPLE);
    jenks(&sample, classes)
}

/// Échantillon régulier de `max` valeurs, min et max conservés
pub fn downsample(sorted: &[f64], max: usize) -> Vec<f64> {
    if sorted.len() <= max || max < 2 {
        return sorted.to_vec();
    }
    let last = (sorted.len() - 1) as f64;
    (0..max)
        .map(|i| {
            let idx = (last * i as f64 / (max - 1) as f64).round() as usize;
            sorted[idx]
        })
        .collect()
}

fn jenks(data: &[f64], k: usize) -> Vec<f64> {
    let n = data.len();
    // lower[l][j] : indice (base 1) du début de la dernière classe pour
    // les l premières valeurs en j classes
    let mut lower = vec![vec![0usize; k + 1]; n + 1];
    let mut variance = vec![vec![f64::INFINITY; k + 1]; n + 1];
    for j in 1..=k {
        lower[1][j] = 1;
        variance[1][j] = 0.0;
    }

    for l in 2..=n {
        let (mut sum, mut sum_sq, mut count) = (0.0, 0.0, 0.0);
        let mut v = 0.0;
        for m in 1..=l {
            let start = l - m + 1;
            let value = data[start - 1];
            sum += value;
            sum_sq += value * value;
            count += 1.0;
            v = sum_sq - (sum * sum) / count;

            let prev = start - 1;
            if prev != 0 {
                for j in 2..=k {
                    let candidate = v + variance[prev][j - 1];
                    if variance[l][j] >= candidate {
                        lower[l][j] = start;
                        variance[l][j] = candidate;
                    }
                }
            }
        }
        lower[l][1] = 1;
        variance[l][1] = v;
    }

    let mut breaks = vec![0.0; k + 1];
    breaks[0] = data[0];
    breaks[k] = data[n - 1];
    let mut end = n;
    for j in (2..=k).rev() {
        let start = lower[end][j].max(2);
        breaks[j - 1] = data[start - 2];
        end = start - 1;
    }
    breaks
}

/// Arrondit à la précision d'affichage ; la première borne est arrondie vers
/// le bas et la dernière vers le haut pour que min et max restent couverts
pub fn round_breaks(breaks: &mut [f64]) {
    let factor = 10f64.powi(BREAK_DECIMALS);
    let last = breaks.len().saturating_sub(1);
    for (i, b) in breaks.iter_mut().enumerate() {
        let scaled = *b * factor;
        let rounded = if i == 0 {
            scaled.floor()
        } else if i == last {
            scaled.ceil()
        } else {
            scaled.round()
        };
        *b = rounded / factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_interval() {
        let values = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(equal_interval(&values, 5), vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        assert!(equal_interval(&[], 5).is_empty());
    }

    #[test]
    fn test_quantile() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        assert_eq!(quantile(&values, 4), vec![0.0, 25.0, 50.0, 75.0, 100.0]);

        let uneven = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&uneven, 2), vec![1.0, 2.5, 4.0]);
    }

    #[test]
    fn test_natural_breaks_finds_clusters() {
        let values = [1.0, 1.5, 2.0, 10.0, 10.5, 11.0, 50.0, 51.0, 52.0];
        let breaks = natural_breaks(&values, 3);
        assert_eq!(breaks, vec![1.0, 2.0, 11.0, 52.0]);
    }

    #[test]
    fn test_natural_breaks_few_values() {
        assert_eq!(natural_breaks(&[1.0, 2.0], 3).len(), 4);
    }

    #[test]
    fn test_downsample_keeps_extremes() {
        let values: Vec<f64> = (0..10_000).map(f64::from).collect();
        let sample = downsample(&values, JENKS_MAX_SAMPLE);
        assert_eq!(sample.len(), JENKS_MAX_SAMPLE);
        assert_eq!(sample.first(), Some(&0.0));
        assert_eq!(sample.last(), Some(&9999.0));
        assert!(sample.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_round_breaks() {
        let mut breaks = vec![0.123, 1.005_1, 2.499, 3.001];
        round_breaks(&mut breaks);
        assert_eq!(breaks, vec![0.12, 1.01, 2.5, 3.01]);
    }
}
