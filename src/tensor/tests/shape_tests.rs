use crate::assert_err;
use crate::errors::NeuronError;
use crate::tensor::{Tensor, TensorSize};

#[test]
fn test_size_len() {
    let size = TensorSize::new(4, 5, 6);
    assert_eq!(size.len(), 120);
    assert!(!size.is_empty());
    assert!(TensorSize::new(0, 5, 6).is_empty());
    assert_eq!(size.to_vec(), vec![4, 5, 6]);
    assert_eq!(TensorSize::from((4, 5, 6)), size);
}

#[test]
fn test_reshape_keeps_element_order() {
    let data: Vec<f32> = (0..12).map(|x| x as f32).collect();
    let tensor = Tensor::from_vec(data.clone(), TensorSize::new(2, 2, 3)).unwrap();
    let reshaped = tensor.reshape(TensorSize::new(3, 4, 1)).unwrap();
    assert_eq!(reshaped.shape(), [3, 4, 1]);
    assert_eq!(reshaped.to_vec(), data);

    assert_err!(
        tensor.reshape(TensorSize::new(5, 5, 1)),
        NeuronError::ShapeMismatch { .. }
    );
}

#[test]
fn test_get_padded_returns_zero_out_of_bounds() {
    let tensor = Tensor::filled(TensorSize::new(2, 2, 1), 3.);
    assert_eq!(tensor.get_padded(0, 0, 0), 3.);
    assert_eq!(tensor.get_padded(0, -1, 0), 0.);
    assert_eq!(tensor.get_padded(0, 1, 2), 0.);
    assert_eq!(tensor.get_padded(0, 2, 1), 0.);
}
