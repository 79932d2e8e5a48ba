use leafmatch::{ImageView, LeafMatchError, OwnedImage, Rect};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        LeafMatchError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        LeafMatchError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, LeafMatchError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn image_view_roi_matches_expected_values() {
    let data: Vec<u8> = (0u8..16).collect();
    let view = ImageView::from_slice(&data, 4, 4).unwrap();
    let roi = view.roi(1, 1, 2, 2).unwrap();
    assert_eq!(roi.width(), 2);
    assert_eq!(roi.stride(), 4);
    assert_eq!(roi.row(0), Some(&[5u8, 6][..]));
    assert_eq!(roi.row(1), Some(&[9u8, 10][..]));
    assert_eq!(roi.get(2, 0), None);

    let err = view.roi(3, 3, 2, 1).err().unwrap();
    assert!(matches!(err, LeafMatchError::RoiOutOfBounds { .. }));
}

#[test]
fn writes_through_nested_rois_reach_the_parent() {
    let mut img = OwnedImage::filled(6, 5, 0.0f32).unwrap();
    {
        let mut view = img.view_mut();
        let mut outer = view.roi_mut(1, 1, 4, 3).unwrap();
        let mut inner = outer.roi_mut(1, 1, 2, 2).unwrap();
        inner.fill(2.5);
        *inner.get_mut(1, 1).unwrap() = 7.0;
    }
    assert_eq!(img.get(2, 2), Some(&2.5));
    assert_eq!(img.get(3, 3), Some(&7.0));
    assert_eq!(img.get(1, 1), Some(&0.0));
    let total: f32 = img.data().iter().sum();
    assert_eq!(total, 2.5 * 3.0 + 7.0);
}

#[test]
fn copy_from_requires_matching_sizes() {
    let src = OwnedImage::filled(2, 2, 9u8).unwrap();
    let mut dst = OwnedImage::filled(4, 4, 0u8).unwrap();
    {
        let mut view = dst.view_mut();
        let mut roi = view.roi_mut(2, 2, 2, 2).unwrap();
        roi.copy_from(src.view()).unwrap();
        let mut wrong = view.roi_mut(0, 0, 3, 2).unwrap();
        assert!(matches!(
            wrong.copy_from(src.view()),
            Err(LeafMatchError::SizeMismatch { .. })
        ));
    }
    assert_eq!(dst.get(3, 3), Some(&9));
    assert_eq!(dst.get(1, 1), Some(&0));
}

#[test]
fn rect_intersection_and_bounds() {
    let a = Rect::from_ltrb(0, 0, 10, 10);
    let b = Rect::from_ltrb(5, -3, 20, 4);
    let i = a.intersection(b);
    assert_eq!(i, Rect::from_ltrb(5, 0, 10, 4));
    assert!(a.contains(i));
    assert!(Rect::from_ltrb(8, 0, 3, 4).is_empty());
    assert_eq!(i.to_usize(), Some((5, 0, 5, 4)));
}
