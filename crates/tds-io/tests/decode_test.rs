use std::io::Cursor;

use tds_core::byte_stream::{ByteStream, StreamConfig};
use tds_core::decode_options::{DecodeOptions, NormalMode};
use tds_core::emitted_scene::{Batch, EmittedScene, NormalBinding};
use tds_core::status::{DecodeError, DecodeResult, Status};
use tds_core::vector::Vector3f;
use tds_io::chunk_ids::*;
use tds_io::chunk_writer::ChunkWriter;
use tds_io::{decode, Decoder, Reader, TdsReader};

// =============================================================================
// Fixture helpers
// =============================================================================

fn build_file<F>(editor: F) -> Vec<u8>
where
    F: FnOnce(&mut ChunkWriter<'_>) -> Status,
{
    let mut stream = ByteStream::memory(StreamConfig::default());
    let mut w = ChunkWriter::new(&mut stream);
    w.chunk(MAIN, |w| {
        w.scalar_chunk(VERSION, 3u32)?;
        w.chunk(EDITOR, editor)
    })
    .unwrap();
    w.finish().unwrap();
    stream.into_memory().unwrap()
}

fn write_object<F>(
    w: &mut ChunkWriter<'_>,
    name: &str,
    vertices: &[[f32; 3]],
    faces: &[[u16; 3]],
    face_extra: F,
) -> Status
where
    F: FnOnce(&mut ChunkWriter<'_>) -> Status,
{
    w.chunk(NAMED_OBJECT, |w| {
        w.write_zstring(name)?;
        w.chunk(TRIANGLE_MESH, |w| {
            w.chunk(VERTEX_ARRAY, |w| {
                w.write(vertices.len() as u16)?;
                for v in vertices {
                    w.write_array(v)?;
                }
                Ok(())
            })?;
            w.chunk(FACE_ARRAY, |w| {
                w.write(faces.len() as u16)?;
                for f in faces {
                    w.write_array(f)?;
                    w.write(7u16)?;
                }
                face_extra(w)
            })
        })
    })
}

fn write_group(w: &mut ChunkWriter<'_>, material: &str, faces: &[u16]) -> Status {
    w.chunk(MATERIAL_GROUP, |w| {
        w.write_zstring(material)?;
        w.write(faces.len() as u16)?;
        w.write_array(faces)
    })
}

fn write_plain_material(w: &mut ChunkWriter<'_>, name: &str) -> Status {
    w.chunk(MATERIAL_ENTRY, |w| {
        w.chunk(MAT_NAME, |w| w.write_zstring(name))
    })
}

fn no_extra(_: &mut ChunkWriter<'_>) -> Status {
    Ok(())
}

fn decode_bytes(bytes: Vec<u8>, options: &DecodeOptions) -> DecodeResult<EmittedScene> {
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    decode(&mut stream, options)
}

fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
}

const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn single_triangle_decodes_with_flat_normal() {
    let bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], no_extra));
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let mut decoder = Decoder::new(DecodeOptions::default());
    let scene = decoder.decode(&mut stream).unwrap();

    let d = decoder.diagnostics();
    assert_eq!((d.object_count, d.vertex_count, d.face_count, d.degenerate_count), (1, 3, 1, 0));
    assert_eq!(scene.info.version, Some(3));

    let object = &scene.objects[0];
    assert_eq!(object.name.as_deref(), Some("Tri"));
    assert_eq!(object.batches.len(), 2);
    match &object.batches[1] {
        Batch::FlatTriangles(t) => {
            // File Z-up (0,0,1) becomes model Y-up.
            assert_eq!(t.normal_binding, NormalBinding::PerFace);
            assert_eq!(t.normals.len(), 1);
            assert!(approx(t.normals[0], [0.0, 1.0, 0.0]));
            assert_eq!(t.positions[2], [0.0, 0.0, -1.0]);
        }
        other => panic!("unexpected batch {:?}", other),
    }
}

#[test]
fn degenerate_face_is_counted_but_not_emitted() {
    let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
    let bytes = build_file(|w| {
        write_object(w, "Quad", &vertices, &[[0, 1, 2], [0, 0, 3], [1, 3, 2]], no_extra)
    });
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let mut decoder = Decoder::new(DecodeOptions::default());
    let scene = decoder.decode(&mut stream).unwrap();

    assert_eq!(decoder.diagnostics().degenerate_count, 1);
    assert_eq!(scene.triangle_count(), 2);
    match &scene.objects[0].batches[1] {
        Batch::FlatTriangles(t) => assert_eq!(t.positions.len(), 6),
        other => panic!("unexpected batch {:?}", other),
    }
}

#[test]
fn unresolved_material_fails() {
    let bytes = build_file(|w| {
        write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], |w| write_group(w, "Missing", &[0]))
    });
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert_eq!(err, DecodeError::UnresolvedMaterialReference("Missing".into()));
}

#[test]
fn face_claimed_twice_fails() {
    let bytes = build_file(|w| {
        write_plain_material(w, "A")?;
        write_plain_material(w, "B")?;
        write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], |w| {
            write_group(w, "A", &[0])?;
            write_group(w, "B", &[0])
        })
    });
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert_eq!(
        err,
        DecodeError::DuplicateMaterialAssignment {
            face: 0,
            material: "B".into()
        }
    );
}

#[test]
fn centering_and_rescaling() {
    let vertices = [[-2.0, -2.0, -2.0], [2.0, -2.0, -2.0], [2.0, 2.0, 2.0]];
    let bytes = build_file(|w| write_object(w, "Box", &vertices, &[[0, 1, 2]], no_extra));
    let options = DecodeOptions::default()
        .with_center_model(true)
        .with_target_size(10.0);
    let scene = decode_bytes(bytes, &options).unwrap();

    let transform = scene.transform.unwrap();
    assert_eq!(transform.translation, Vector3f::ZERO);
    assert_eq!(transform.scale, 2.5);
    assert_eq!(scene.bounds.min(), Vector3f::splat(-2.0));
    assert_eq!(scene.bounds.max(), Vector3f::splat(2.0));
}

// =============================================================================
// Structural robustness
// =============================================================================

#[test]
fn truncated_input_fails_without_partial_scene() {
    let bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], no_extra));
    for cut in [3, 10, bytes.len() / 2, bytes.len() - 1] {
        let err = decode_bytes(bytes[..cut].to_vec(), &DecodeOptions::default()).unwrap_err();
        assert!(
            matches!(err, DecodeError::TruncatedStream(_) | DecodeError::MalformedHeader(_)),
            "cut at {}: {:?}",
            cut,
            err
        );
    }
}

#[test]
fn vertex_count_larger_than_payload_fails() {
    let bytes = build_file(|w| {
        w.chunk(NAMED_OBJECT, |w| {
            w.write_zstring("Liar")?;
            w.chunk(TRIANGLE_MESH, |w| {
                w.chunk(VERTEX_ARRAY, |w| {
                    w.write(1000u16)?;
                    w.write_array(&[0.0f32; 3])
                })
            })
        })
    });
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedStream(_)));
}

#[test]
fn child_longer_than_parent_is_malformed() {
    let mut bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], no_extra));
    // The VERSION chunk starts right after the root header; inflate its length.
    assert_eq!(&bytes[6..8], &VERSION.to_le_bytes());
    bytes[8..12].copy_from_slice(&10_000u32.to_le_bytes());
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedHeader(_)));
}

#[test]
fn wrong_magic_is_malformed() {
    let mut bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], no_extra));
    bytes[0] = 0x00;
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedHeader(_)));
}

#[test]
fn unknown_chunks_are_skipped() {
    let bytes = build_file(|w| {
        w.chunk(0x7001, |w| w.write_bytes(&[1, 2, 3]))?;
        w.chunk(NAMED_OBJECT, |w| {
            w.write_zstring("Lamp")?;
            w.chunk(0x4600, |w| w.write_array(&[0.0f32; 3]))
        })?;
        write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], |w| w.empty_chunk(0x4199))
    });
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let mut decoder = Decoder::new(DecodeOptions::default().with_debug_level(2));
    let scene = decoder.decode(&mut stream).unwrap();

    assert_eq!(scene.objects.len(), 1);
    assert_eq!(decoder.diagnostics().skipped_chunks, 3);
}

#[test]
fn vertex_array_twice_fails() {
    let bytes = build_file(|w| {
        w.chunk(NAMED_OBJECT, |w| {
            w.write_zstring("Twice")?;
            w.chunk(TRIANGLE_MESH, |w| {
                for _ in 0..2 {
                    w.chunk(VERTEX_ARRAY, |w| {
                        w.write(1u16)?;
                        w.write_array(&[0.0f32; 3])
                    })?;
                }
                Ok(())
            })
        })
    });
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::DuplicateChunk(_)));
}

#[test]
fn faces_before_vertices_fail() {
    let bytes = build_file(|w| {
        w.chunk(NAMED_OBJECT, |w| {
            w.write_zstring("Backwards")?;
            w.chunk(TRIANGLE_MESH, |w| {
                w.chunk(FACE_ARRAY, |w| {
                    w.write(1u16)?;
                    w.write_array(&[0u16, 1, 2, 0])
                })
            })
        })
    });
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::MissingPrerequisiteChunk(_)));
}

#[test]
fn face_index_out_of_range_fails() {
    let bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 5]], no_extra));
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::IndexOutOfRange { what: "vertex", index: 5, .. }));
}

#[test]
fn overlong_name_fails() {
    let name = "n".repeat(MAX_NAME_LEN);
    let bytes = build_file(|w| write_object(w, &name, &TRIANGLE, &[[0, 1, 2]], no_extra));
    let err = decode_bytes(bytes, &DecodeOptions::default()).unwrap_err();
    assert_eq!(err, DecodeError::StringTooLong { max_len: MAX_NAME_LEN });
}

#[test]
fn invalid_target_size_is_rejected_up_front() {
    let bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], no_extra));
    let err = decode_bytes(bytes, &DecodeOptions::default().with_target_size(-1.0)).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidConfiguration(_)));
}

// =============================================================================
// Materials and emission options
// =============================================================================

fn material_file() -> Vec<u8> {
    build_file(|w| {
        w.chunk(MATERIAL_ENTRY, |w| {
            w.chunk(MAT_NAME, |w| w.write_zstring("Brick"))?;
            w.chunk(MAT_DIFFUSE, |w| {
                w.chunk(COLOR_24, |w| w.write_bytes(&[255, 0, 0]))?;
                w.chunk(LIN_COLOR_24, |w| w.write_bytes(&[0, 255, 0]))
            })?;
            w.chunk(MAT_AMBIENT, |w| w.chunk(COLOR_24, |w| w.write_bytes(&[0, 0, 255])))?;
            w.chunk(MAT_SHININESS, |w| w.scalar_chunk(INT_PERCENTAGE, 50i16))?;
            w.chunk(MAT_TRANSPARENCY, |w| w.scalar_chunk(FLOAT_PERCENTAGE, 150.0f32))?;
            w.empty_chunk(MAT_TWO_SIDE)?;
            w.chunk(MAT_TEXMAP, |w| {
                w.chunk(MAT_MAPNAME, |w| w.write_zstring("brick.png"))?;
                w.scalar_chunk(MAT_MAP_USCALE, 4.0f32)
            })
        })?;
        let vertices: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        w.chunk(NAMED_OBJECT, |w| {
            w.write_zstring("Wall")?;
            w.chunk(TRIANGLE_MESH, |w| {
                w.chunk(VERTEX_ARRAY, |w| {
                    w.write(4u16)?;
                    for v in &vertices {
                        w.write_array(v)?;
                    }
                    Ok(())
                })?;
                w.chunk(TEX_VERTS, |w| {
                    w.write(4u16)?;
                    w.write_array(&[0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0])
                })?;
                w.chunk(FACE_ARRAY, |w| {
                    w.write(2u16)?;
                    w.write_array(&[0u16, 1, 2, 0, 0, 2, 3, 0])?;
                    write_group(w, "Brick", &[1])
                })
            })
        })
    })
}

#[test]
fn material_entry_is_parsed() {
    let bytes = material_file();
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let file = Decoder::new(DecodeOptions::default())
        .read_file(&mut stream)
        .unwrap();

    let id = file.materials.lookup("Brick").unwrap();
    let brick = file.materials.get(id).unwrap();
    assert_eq!(brick.diffuse, [0.0, 1.0, 0.0]);
    assert_eq!(brick.ambient, [0.0, 0.0, 1.0]);
    assert_eq!(brick.shininess, 0.5);
    assert_eq!(brick.transparency, 1.0);
    assert!(brick.two_sided);
    let map = brick.texture.as_ref().unwrap();
    assert_eq!(map.filename, "brick.png");
    assert_eq!(map.scale, [4.0, 1.0]);
    assert_eq!(map.offset, [0.0, 0.0]);
}

#[test]
fn textured_group_emits_state_then_geometry() {
    let scene = decode_bytes(material_file(), &DecodeOptions::default()).unwrap();
    let kinds: Vec<_> = scene.batches().map(Batch::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "material",
            "flat-triangles",
            "texture",
            "texture-transform",
            "material",
            "flat-triangles"
        ]
    );
    match scene.objects[0].batches.last() {
        Some(Batch::FlatTriangles(t)) => {
            assert_eq!(t.tex_coords, vec![[0.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
        }
        other => panic!("unexpected batch {:?}", other),
    }
}

#[test]
fn materials_disabled_ignores_groups() {
    let options = DecodeOptions::default().with_materials(false);
    let scene = decode_bytes(material_file(), &options).unwrap();
    let kinds: Vec<_> = scene.batches().map(Batch::kind).collect();
    assert_eq!(kinds, vec!["material", "flat-triangles"]);
    assert_eq!(scene.triangle_count(), 2);

    // An unresolvable group is not even looked at.
    let bytes = build_file(|w| {
        write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], |w| write_group(w, "Missing", &[0]))
    });
    assert!(decode_bytes(bytes, &options).is_ok());
}

#[test]
fn indexed_output_shares_vertices() {
    let options = DecodeOptions::default()
        .with_indexed_output(true)
        .with_normal_mode(NormalMode::Smooth);
    let scene = decode_bytes(material_file(), &options).unwrap();
    let object = &scene.objects[0];
    assert_eq!(object.positions.len(), 4);
    assert_eq!(object.tex_coords.len(), 4);

    let indices: Vec<u32> = object
        .batches
        .iter()
        .filter_map(|b| match b {
            Batch::IndexedTriangles(t) => Some(t.indices.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(scene.triangle_count(), 2);
}

#[test]
fn object_names_can_be_dropped() {
    let bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], no_extra));
    let scene = decode_bytes(bytes, &DecodeOptions::default().with_object_names(false)).unwrap();
    assert_eq!(scene.objects[0].name, None);
}

#[test]
fn multiple_objects_share_scene_bounds() {
    let far = [[10.0, 0.0, 0.0], [11.0, 0.0, 0.0], [10.0, 1.0, 0.0]];
    let bytes = build_file(|w| {
        write_object(w, "Near", &TRIANGLE, &[[0, 1, 2]], no_extra)?;
        write_object(w, "Far", &far, &[[0, 1, 2]], no_extra)
    });
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let mut decoder = Decoder::new(DecodeOptions::default().with_center_model(true));
    let scene = decoder.decode(&mut stream).unwrap();

    assert_eq!(scene.objects.len(), 2);
    assert_eq!(decoder.diagnostics().object_count, 2);
    assert_eq!(scene.bounds.max().x, 11.0);
    assert_eq!(scene.transform.unwrap().translation.x, -5.5);
    // State caching restarts per object.
    for object in &scene.objects {
        assert!(matches!(object.batches[0], Batch::Material { .. }));
    }
}

#[test]
fn tex_coord_count_mismatch_is_tolerated() {
    let bytes = build_file(|w| {
        w.chunk(NAMED_OBJECT, |w| {
            w.write_zstring("Short")?;
            w.chunk(TRIANGLE_MESH, |w| {
                w.chunk(VERTEX_ARRAY, |w| {
                    w.write(3u16)?;
                    for v in &TRIANGLE {
                        w.write_array(v)?;
                    }
                    Ok(())
                })?;
                w.chunk(TEX_VERTS, |w| {
                    w.write(1u16)?;
                    w.write_array(&[0.5f32, 0.5])
                })
            })
        })
    });
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let file = Decoder::new(DecodeOptions::default())
        .read_file(&mut stream)
        .unwrap();
    let model = &file.objects[0].model;
    assert_eq!(model.vertices()[0].tex_coord, Some([0.5, 0.5]));
    assert_eq!(model.vertices()[1].tex_coord, None);
}

#[test]
fn adjacency_diagnostics() {
    let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    let bytes = build_file(|w| write_object(w, "Quad", &vertices, &[[0, 1, 2], [0, 2, 3]], no_extra));
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let mut decoder = Decoder::new(DecodeOptions::default().with_adjacency(true));
    decoder.decode(&mut stream).unwrap();
    assert_eq!(decoder.diagnostics().boundary_edges, 4);
    assert_eq!(decoder.diagnostics().non_manifold_edges, 0);
}

// =============================================================================
// Stream backends
// =============================================================================

#[test]
fn decodes_from_forward_only_reader() {
    let bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], no_extra));
    let mut stream = ByteStream::wrap(Cursor::new(bytes), StreamConfig::default());
    let scene = decode(&mut stream, &DecodeOptions::default()).unwrap();
    assert_eq!(scene.triangle_count(), 1);
}

#[test]
fn reader_trait_reads_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tri.3ds");
    let bytes = build_file(|w| write_object(w, "Tri", &TRIANGLE, &[[0, 1, 2]], no_extra));
    std::fs::write(&path, bytes).unwrap();

    let mut reader = TdsReader::open(&path).unwrap();
    let first = reader.read_scene().unwrap();
    let second = reader.read_scene().unwrap();
    assert_eq!(first, second);
    assert_eq!(reader.diagnostics().face_count, 1);
}

#[test]
fn diagnostics_survive_failure() {
    let bytes = build_file(|w| {
        write_plain_material(w, "A")?;
        write_object(w, "Good", &TRIANGLE, &[[0, 1, 2]], no_extra)?;
        write_object(w, "Bad", &TRIANGLE, &[[0, 1, 2]], |w| write_group(w, "Nope", &[0]))
    });
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let mut decoder = Decoder::new(DecodeOptions::default());
    assert!(decoder.decode(&mut stream).is_err());
    let diagnostics = decoder.diagnostics();
    assert_eq!(diagnostics.object_count, 1);
    assert_eq!(diagnostics.material_count, 1);
    assert_eq!(diagnostics.vertex_count, 6);
    assert_eq!(diagnostics.face_count, 2);
    assert!(stream.is_good());
}

#[test]
fn failed_object_still_counts_its_geometry() {
    let bytes = build_file(|w| {
        write_object(w, "Lone", &TRIANGLE, &[[0, 1, 2], [0, 0, 1]], |w| {
            write_group(w, "Nope", &[0])
        })
    });
    let mut stream = ByteStream::from_vec(bytes, StreamConfig::default());
    let mut decoder = Decoder::new(DecodeOptions::default());
    assert!(matches!(
        decoder.decode(&mut stream),
        Err(DecodeError::UnresolvedMaterialReference(_))
    ));
    let diagnostics = decoder.diagnostics();
    assert_eq!(diagnostics.object_count, 0);
    assert_eq!(diagnostics.vertex_count, 3);
    assert_eq!(diagnostics.face_count, 2);
    assert_eq!(diagnostics.degenerate_count, 1);
}
