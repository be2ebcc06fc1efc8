use super::*;

fn rect_node(center: Point, w: f64, h: f64) -> Node {
    Node::new(
        NodeKind::Rect {
            width: w,
            height: h,
            corner_radius: 0.0,
        },
        Style::default(),
        center,
    )
}

fn group_node(center: Point) -> Node {
    Node::new(
        NodeKind::Group {
            children: Vec::new(),
        },
        Style::default(),
        center,
    )
}

#[test]
fn adopt_preserves_world_placement() {
    let mut scene = Scene::new(160.0);
    let a = scene.insert(rect_node(Point::new(-1.0, 0.0), 1.0, 1.0));
    let b = scene.insert(rect_node(Point::new(1.0, 2.0), 1.0, 1.0));
    let g = scene.insert(group_node(Point::new(0.0, 1.0)));
    scene.adopt(g, &[a, b]).unwrap();

    assert_eq!(scene.world_center(a).unwrap(), Point::new(-1.0, 0.0));
    assert_eq!(scene.node(b).unwrap().center, Point::new(1.0, 1.0));
    assert_eq!(scene.bounds(g).unwrap(), Rect::new(-1.5, -0.5, 1.5, 2.5));
}

#[test]
fn group_scale_and_opacity_propagate() {
    let mut scene = Scene::new(160.0);
    let a = scene.insert(rect_node(Point::new(2.0, 0.0), 2.0, 2.0));
    let g = scene.insert(group_node(Point::ORIGIN));
    scene.adopt(g, &[a]).unwrap();

    {
        let gn = scene.node_mut(g).unwrap();
        gn.scale = 0.5;
        gn.opacity = 0.8;
        gn.center = Point::new(1.0, 1.0);
    }
    scene.node_mut(a).unwrap().opacity = 0.5;

    assert_eq!(scene.world_center(a).unwrap(), Point::new(2.0, 1.0));
    assert!((scene.world_scale(a).unwrap() - 0.5).abs() < 1e-12);
    assert!((scene.world_opacity(a).unwrap() - 0.4).abs() < 1e-12);
    assert_eq!(scene.bounds(a).unwrap(), Rect::new(1.5, 0.5, 2.5, 1.5));
}

#[test]
fn adopting_twice_is_rejected() {
    let mut scene = Scene::new(160.0);
    let a = scene.insert(rect_node(Point::ORIGIN, 1.0, 1.0));
    let g1 = scene.insert(group_node(Point::ORIGIN));
    let g2 = scene.insert(group_node(Point::ORIGIN));
    scene.adopt(g1, &[a]).unwrap();
    assert!(scene.adopt(g2, &[a]).is_err());
    assert!(scene.adopt(a, &[g2]).is_err());
}

#[test]
fn staging_a_group_covers_members() {
    let mut scene = Scene::new(160.0);
    let a = scene.insert(rect_node(Point::ORIGIN, 1.0, 1.0));
    let b = scene.insert(rect_node(Point::ORIGIN, 1.0, 1.0));
    let g = scene.insert(group_node(Point::ORIGIN));
    scene.adopt(g, &[a]).unwrap();

    scene.stage_add(g).unwrap();
    scene.stage_add(a).unwrap();
    scene.stage_add(b).unwrap();
    assert_eq!(scene.stage(), &[g, b]);
    assert!(scene.is_staged(a));

    scene.stage_add(a).unwrap();
    scene.stage_remove(g).unwrap();
    assert_eq!(scene.stage(), &[b]);
    assert!(!scene.is_staged(a));
}

#[test]
fn removing_a_group_unstages_individually_staged_members() {
    let mut scene = Scene::new(160.0);
    let a = scene.insert(rect_node(Point::ORIGIN, 1.0, 1.0));
    let b = scene.insert(rect_node(Point::ORIGIN, 1.0, 1.0));
    scene.stage_add(a).unwrap();
    scene.stage_add(b).unwrap();
    let g = scene.insert(group_node(Point::ORIGIN));
    scene.adopt(g, &[a, b]).unwrap();

    scene.stage_remove(g).unwrap();
    assert!(scene.stage().is_empty());
}

#[test]
fn patch_partial_interpolates_from_start() {
    let start = rect_node(Point::new(0.0, 0.0), 1.0, 1.0);
    let mut node = start.clone();
    let patch = NodePatch {
        center: Some(Point::new(2.0, -4.0)),
        scale: Some(3.0),
        opacity: None,
    };
    patch.apply_partial(&start, &mut node, 0.5);
    assert_eq!(node.center, Point::new(1.0, -2.0));
    assert!((node.scale - 2.0).abs() < 1e-12);
    assert_eq!(node.opacity, 1.0);
}

#[test]
fn set_blend_requires_blended_image() {
    let mut scene = Scene::new(160.0);
    let grid = Arc::new(RgbaGrid::from_fn(2, 2, |_, _| [0, 0, 0, 255]));
    let target = Arc::new(RgbaGrid::from_fn(2, 2, |_, _| [200, 100, 50, 255]));
    let img = scene.insert(Node::new(
        NodeKind::Image {
            source: ImageSource::Blend {
                from: grid.clone(),
                to: target,
                alpha: 0.0,
            },
            height: 1.0,
        },
        Style::default(),
        Point::ORIGIN,
    ));
    let rect = scene.insert(rect_node(Point::ORIGIN, 1.0, 1.0));

    scene.set_blend(img, 2.0).unwrap();
    let NodeKind::Image { source, .. } = &scene.node(img).unwrap().kind else {
        panic!("expected image");
    };
    assert_eq!(source.resolve().unwrap().pixel(0, 0), [200, 100, 50, 255]);
    assert!(scene.set_blend(rect, 0.5).is_err());
    assert!(scene.set_blend(img, f64::NAN).is_err());
}

#[test]
fn unknown_node_is_an_error() {
    let scene = Scene::new(160.0);
    assert!(matches!(
        scene.node(NodeId(3)),
        Err(ReelError::Evaluation(_))
    ));
}
