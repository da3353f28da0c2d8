//! Vector similarity helpers used by the embedding smoke test

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = l2_norm(a) * l2_norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    dot(a, b) / denom
}

/// `matrix[i][j]` is the cosine similarity of query `i` and document `j`
pub fn similarity_matrix(queries: &[Vec<f32>], docs: &[Vec<f32>]) -> Vec<Vec<f32>> {
    queries
        .iter()
        .map(|q| docs.iter().map(|d| cosine_similarity(q, d)).collect())
        .collect()
}

/// True when every row scores its own index strictly higher than any other column.
pub fn diagonal_is_max(matrix: &[Vec<f32>]) -> bool {
    matrix.iter().enumerate().all(|(i, row)| {
        let Some(&diag) = row.get(i) else {
            return false;
        };
        row.iter()
            .enumerate()
            .all(|(j, &score)| j == i || diag > score)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn matched_pairs_win_on_the_diagonal() {
        let queries = vec![vec![0.9, 0.1], vec![0.2, 0.8]];
        let docs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let matrix = similarity_matrix(&queries, &docs);
        assert_eq!(matrix.len(), 2);
        assert!(diagonal_is_max(&matrix));
    }

    #[test]
    fn swapped_pairs_fail_the_check() {
        let queries = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let docs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!(!diagonal_is_max(&similarity_matrix(&queries, &docs)));
    }

    #[test]
    fn ties_do_not_count_as_a_match() {
        assert!(!diagonal_is_max(&[vec![0.5, 0.5], vec![0.1, 0.9]]));
    }
}
