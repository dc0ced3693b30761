use std::fs::OpenOptions;

use proptest::prelude::*;
use tempfile::TempDir;
use vecprobe_engine::vecs::{encode_record, read_all, read_range, record_size, write_vecs};
use vecprobe_engine::BenchError;

fn uniform_records(dim: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-1.0e6f32..1.0e6f32, dim), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn written_records_decode_exactly(
        records in (1usize..64).prop_flat_map(uniform_records)
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("q.fvecs");
        write_vecs(&path, &records).unwrap();

        let decoded = read_all::<f32>(&path).unwrap();
        prop_assert_eq!(decoded.len(), records.len());
        for (got, want) in decoded.iter().zip(records.iter()) {
            let got_bits: Vec<u32> = got.iter().map(|v| v.to_bits()).collect();
            let want_bits: Vec<u32> = want.iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(got_bits, want_bits);
        }
    }

    #[test]
    fn range_is_a_slice_of_the_whole_file(
        (records, a, b) in (1usize..16)
            .prop_flat_map(uniform_records)
            .prop_flat_map(|records| {
                let n = records.len();
                (Just(records), 1..=n)
            })
            .prop_flat_map(|(records, a)| {
                let n = records.len();
                (Just(records), Just(a), a..=n)
            })
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("q.fvecs");
        write_vecs(&path, &records).unwrap();

        let all = read_all::<f32>(&path).unwrap();
        let ranged = read_range::<f32>(&path, a, Some(b)).unwrap();
        prop_assert_eq!(ranged.len(), b - a + 1);
        prop_assert_eq!(&ranged[..], &all[a - 1..b]);

        let tail = read_range::<f32>(&path, a, None).unwrap();
        prop_assert_eq!(&tail[..], &all[a - 1..]);
    }
}

#[test]
fn truncated_mid_record_is_a_decode_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gt.ivecs");
    let records: Vec<Vec<i32>> = (0..3).map(|i| vec![i, i + 1, i + 2, i + 3]).collect();
    write_vecs(&path, &records).unwrap();

    let full = record_size(4) * 3;
    for cut in [full - 1, full - 4, record_size(4) + 2] {
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(cut).unwrap();
        drop(file);

        match read_all::<i32>(&path) {
            Err(BenchError::Decode { offset, .. }) => assert!(offset <= cut),
            other => panic!("cut at {cut}: expected decode error, got {other:?}"),
        }
    }
}

#[test]
fn record_boundary_end_is_clean() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gt.ivecs");
    let mut bytes = encode_record(&[7i32, 8, 9]).unwrap();
    bytes.extend(encode_record(&[1i32, 2, 3]).unwrap());
    std::fs::write(&path, &bytes).unwrap();

    let decoded = read_all::<i32>(&path).unwrap();
    assert_eq!(decoded, vec![vec![7, 8, 9], vec![1, 2, 3]]);
}

#[test]
fn range_past_end_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("q.fvecs");
    write_vecs(&path, &[vec![1.0f32, 2.0], vec![3.0, 4.0]]).unwrap();

    assert!(matches!(
        read_range::<f32>(&path, 5, None),
        Err(BenchError::Decode { .. })
    ));
    assert!(matches!(
        read_range::<f32>(&path, 2, Some(3)),
        Err(BenchError::Decode { .. })
    ));
    assert!(matches!(
        read_range::<f32>(&path, 0, Some(1)),
        Err(BenchError::Configuration(_))
    ));
}

#[test]
fn missing_file_names_the_path() {
    let err = read_all::<f32>(std::path::Path::new("/nonexistent/q.fvecs")).unwrap_err();
    assert!(matches!(err, BenchError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/q.fvecs"));
}
