//! Peak detection with distance and prominence constraints.

/// Locate peaks in `signal`.
///
/// A peak is a strict local maximum (a flat top counts once, at its middle
/// sample). Candidates closer than `min_distance` samples to a taller kept
/// candidate are dropped, then survivors whose prominence falls below
/// `prominence` are dropped. Returned indices are strictly increasing.
pub fn find_peaks(signal: &[f64], min_distance: usize, prominence: f64) -> Vec<usize> {
    let mut peaks = local_maxima(signal);

    if min_distance > 1 {
        peaks = select_by_distance(signal, &peaks, min_distance);
    }

    let prominences = peak_prominences(signal, &peaks);
    peaks
        .into_iter()
        .zip(prominences)
        .filter(|&(_, p)| p >= prominence)
        .map(|(i, _)| i)
        .collect()
}

/// Prominence of each peak: its height above the higher of the two lowest
/// points reached before the signal rises above the peak on either side.
pub fn peak_prominences(signal: &[f64], peaks: &[usize]) -> Vec<f64> {
    peaks
        .iter()
        .map(|&peak| {
            let height = signal[peak];

            let mut left_min = height;
            for &v in signal[..=peak].iter().rev() {
                if v > height {
                    break;
                }
                left_min = left_min.min(v);
            }

            let mut right_min = height;
            for &v in &signal[peak..] {
                if v > height {
                    break;
                }
                right_min = right_min.min(v);
            }

            height - left_min.max(right_min)
        })
        .collect()
}

fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let mut i = 1;
    while i < n - 1 {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                let right_edge = ahead - 1;
                peaks.push((i + right_edge) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

/// Keep the tallest candidates, suppressing neighbours within `min_distance`.
fn select_by_distance(signal: &[f64], peaks: &[usize], min_distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];

    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| signal[peaks[a]].total_cmp(&signal[peaks[b]]));

    for &j in by_height.iter().rev() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < min_distance {
            keep[k - 1] = false;
            k -= 1;
        }

        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < min_distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter(|&(_, kept)| kept)
        .map(|(&p, _)| p)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_maxima() {
        let signal = [0.0, 1.0, 0.0, 2.0, 0.0, 1.5, 0.0];
        assert_eq!(find_peaks(&signal, 0, 0.0), vec![1, 3, 5]);
    }

    #[test]
    fn test_endpoints_are_never_peaks() {
        let signal = [3.0, 1.0, 0.0, 1.0, 3.0];
        assert!(find_peaks(&signal, 0, 0.0).is_empty());
    }

    #[test]
    fn test_plateau_reports_middle() {
        let signal = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&signal, 0, 0.0), vec![2]);

        // A plateau that keeps rising is not a peak
        let signal = [0.0, 1.0, 1.0, 2.0, 0.0];
        assert_eq!(find_peaks(&signal, 0, 0.0), vec![3]);
    }

    #[test]
    fn test_flat_signal_has_no_peaks() {
        assert!(find_peaks(&[0.0; 100], 30, 0.0).is_empty());
    }

    #[test]
    fn test_distance_keeps_tallest() {
        let signal = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.5, 0.0];
        assert_eq!(find_peaks(&signal, 3, 0.0), vec![3, 7]);
    }

    #[test]
    fn test_prominence_uses_higher_valley() {
        let signal = [0.0, 5.0, 3.0, 4.0, 1.0, 6.0, 0.0];
        let peaks = vec![1, 3, 5];
        let prominences = peak_prominences(&signal, &peaks);
        // Peak at 3 only rises 1.0 above the valley at index 2
        assert_eq!(prominences, vec![4.0, 1.0, 6.0]);
        assert_eq!(find_peaks(&signal, 0, 2.0), vec![1, 5]);
        // Threshold is inclusive
        assert_eq!(find_peaks(&signal, 0, 1.0), vec![1, 3, 5]);
    }
}
