//! The third-party components LAMMPS links against, in build order.
//!
//! Paths in make variables are relative to the directory make runs in, which
//! for library packages is `lammps-<rev>/lib/<name>`.

use super::types::{Choice, ComponentSpec, Flag, MakeStep, PostAction, When};
use crate::acquire::Dependency;
use crate::options::Transport;

const MPI: When = When::Transport(Transport::Mpi);
const NO_MPI: When = When::Transport(Transport::None);

const SERIAL_MAKEFILE: &[Choice] = &[Choice::always("Makefile.serial")];

/// Makefile variant per transport.
const TRANSPORT_MAKEFILE: &[Choice] = &[Choice::when(MPI, "Makefile.mpi"), Choice::when(NO_MPI, "Makefile.serial")];

const VORO: ComponentSpec = ComponentSpec {
  name: "Voro++",
  slug: "voro++",
  root: Dependency::Voro,
  subdir: "",
  when: When::Always,
  steps: &[MakeStep {
    directory: Some("src"),
    flags: &[
      Flag::always("CXX", "$${tool:cxx}"),
      Flag::always("CFLAGS", "-O3"),
      Flag::always("AR", "$${tool:ar}"),
    ],
    targets: &[Choice::always("voro++")],
    ..MakeStep::PARALLEL
  }],
  post: &[PostAction::Relocate {
    from: "src/voro++",
    to: "voro++.exe",
    when: When::Always,
  }],
};

const STUBS: ComponentSpec = ComponentSpec {
  name: "MPI STUBS",
  slug: "stubs",
  root: Dependency::Lammps,
  subdir: "src/STUBS",
  when: NO_MPI,
  steps: &[MakeStep {
    flags: &[
      Flag::always("CC", "$${tool:cc}"),
      Flag::always("CCFLAGS", "-O2 -I."),
      Flag::always("ARCHIVE", "$${tool:ar}"),
    ],
    ..MakeStep::SERIAL
  }],
  post: &[],
};

const ATC: ComponentSpec = ComponentSpec {
  name: "AtC",
  slug: "atc",
  root: Dependency::Lammps,
  subdir: "lib/atc",
  when: When::Always,
  steps: &[MakeStep {
    makefiles: TRANSPORT_MAKEFILE,
    flags: &[
      Flag::always("CC", "$${tool:cxx}"),
      Flag::always("ARCHIVE", "$${tool:ar}"),
      Flag::always("CCFLAGS", "-O3"),
      Flag::always("CPPFLAGS", "-I../../src $${var:mpi_inc} $${var:size_model}"),
    ],
    ..MakeStep::PARALLEL
  }],
  post: &[],
};

const AWPMD: ComponentSpec = ComponentSpec {
  name: "AWPMD",
  slug: "awpmd",
  root: Dependency::Lammps,
  subdir: "lib/awpmd",
  when: When::Always,
  steps: &[MakeStep {
    // Makefile.serial has no MPI-free code path, so both variants use the MPI makefile.
    makefiles: &[Choice::always("Makefile.mpi")],
    flags: &[
      Flag::always("CC", "$${tool:cxx}"),
      Flag::always("ARCHIVE", "$${tool:ar}"),
      Flag::when(
        MPI,
        "CCFLAGS",
        "-O3 -Isystems/interact/TCP/ -Isystems/interact -Iivutils/include \
         -DMPICH_IGNORE_CXX_SEEK $${var:mpi_inc} -O3",
      ),
      Flag::when(
        NO_MPI,
        "CCFLAGS",
        "-O3 -Isystems/interact/TCP/ -Isystems/interact -Iivutils/include $${var:mpi_inc} -O3",
      ),
    ],
    ..MakeStep::SERIAL
  }],
  post: &[],
};

const COLVARS: ComponentSpec = ComponentSpec {
  name: "Colvars",
  slug: "colvars",
  root: Dependency::Lammps,
  subdir: "lib/colvars",
  when: When::Always,
  steps: &[MakeStep {
    makefiles: SERIAL_MAKEFILE,
    flags: &[
      Flag::always("CXX", "$${tool:cxx}"),
      Flag::always("CXXFLAGS", "-O3"),
      Flag::always("AR", "$${tool:ar}"),
    ],
    ..MakeStep::PARALLEL
  }],
  post: &[],
};

const GPU_MAKEFILE: &[Choice] = &[Choice::always("Makefile.linux_opencl")];

const GPU_FLAGS: &[Flag] = &[
  Flag::always("AR", "$${tool:ar}"),
  Flag::always("LMP_INC", "$${var:size_model}"),
  Flag::always("OCL_TUNE", "-DKEPLER_OCL"),
  Flag::always("OCL_PREC", "-D_SINGLE_DOUBLE"),
  Flag::always("OCL_INC", "-I../../../OpenCL/include"),
  Flag::when(
    MPI,
    "OCL_LINK",
    "-Wl,--enable-stdcall-fixup ../../../OpenCL/lib_win$${var:bits}/libOpenCL.dll \
     -L../../../mpich2-win$${var:bits}/lib -lmpi",
  ),
  Flag::when(
    NO_MPI,
    "OCL_LINK",
    "-Wl,--enable-stdcall-fixup ../../../OpenCL/lib_win$${var:bits}/libOpenCL.dll -L../../src/STUBS -lmpi_stubs",
  ),
  Flag::when(
    MPI,
    "OCL_CPP",
    "$${tool:cxx} -O3 -DMPI_GERYON -DUCL_NO_EXIT $${var:mpi_inc} $(LMP_INC) $(OCL_INC) -DMPICH_IGNORE_CXX_SEEK",
  ),
  Flag::when(
    NO_MPI,
    "OCL_CPP",
    "$${tool:cxx} -O3 -DMPI_GERYON -DUCL_NO_EXIT $${var:mpi_inc} $(LMP_INC) $(OCL_INC)",
  ),
];

const GPU: ComponentSpec = ComponentSpec {
  name: "GPU",
  slug: "gpu",
  root: Dependency::Lammps,
  subdir: "lib/gpu",
  when: When::Always,
  steps: &[
    MakeStep {
      makefiles: GPU_MAKEFILE,
      flags: GPU_FLAGS,
      targets: &[Choice::always("ocl_get_devices")],
      ..MakeStep::SERIAL
    },
    MakeStep {
      makefiles: GPU_MAKEFILE,
      flags: GPU_FLAGS,
      ..MakeStep::PARALLEL
    },
  ],
  post: &[PostAction::Relocate {
    from: "ocl_get_devices",
    to: "ocl_get_devices.exe",
    when: When::Always,
  }],
};

const LINALG: ComponentSpec = ComponentSpec {
  name: "LinAlg",
  slug: "linalg",
  root: Dependency::Lammps,
  subdir: "lib/linalg",
  when: When::Always,
  steps: &[MakeStep {
    makefiles: SERIAL_MAKEFILE,
    flags: &[
      Flag::always("FC", "$${tool:fc}"),
      Flag::always("FFLAGS", "-O3 -ffast-math -fstrict-aliasing"),
      Flag::always("FFLAGS0", "-O0"),
      Flag::always("ARCHIVE", "$${tool:ar}"),
    ],
    ..MakeStep::PARALLEL
  }],
  post: &[],
};

const MEAM: ComponentSpec = ComponentSpec {
  name: "MEAM",
  slug: "meam",
  root: Dependency::Lammps,
  subdir: "lib/meam",
  when: When::Always,
  steps: &[MakeStep {
    makefiles: SERIAL_MAKEFILE,
    flags: &[
      Flag::always("F90", "$${tool:fc}"),
      Flag::always("CC", "$${tool:cc}"),
      Flag::always("ARCHIVE", "$${tool:ar}"),
      Flag::always("F90FLAGS", "-O3 -ffast-math -fexpensive-optimizations"),
    ],
    ..MakeStep::PARALLEL
  }],
  post: &[],
};

const POEMS: ComponentSpec = ComponentSpec {
  name: "POEMS",
  slug: "poems",
  root: Dependency::Lammps,
  subdir: "lib/poems",
  when: When::Always,
  steps: &[MakeStep {
    makefiles: SERIAL_MAKEFILE,
    flags: &[
      Flag::always("CC", "$${tool:cxx}"),
      Flag::always("CCFLAGS", "-O3"),
      Flag::always("ARCHIVE", "$${tool:ar}"),
    ],
    ..MakeStep::PARALLEL
  }],
  post: &[],
};

const SMD: ComponentSpec = ComponentSpec {
  name: "SMD",
  slug: "smd",
  root: Dependency::Lammps,
  subdir: "lib/smd",
  when: When::Always,
  steps: &[],
  post: &[PostAction::Link {
    dependency: Dependency::Eigen,
    subdir: "",
    link: "includelink",
  }],
};

const VORONOI: ComponentSpec = ComponentSpec {
  name: "Voronoi",
  slug: "voronoi",
  root: Dependency::Lammps,
  subdir: "lib/voronoi",
  when: When::Always,
  steps: &[],
  post: &[
    PostAction::Link {
      dependency: Dependency::Voro,
      subdir: "src",
      link: "includelink",
    },
    PostAction::Link {
      dependency: Dependency::Voro,
      subdir: "src",
      link: "liblink",
    },
  ],
};

/// Every component, in the order it must be built.
pub const COMPONENTS: &[ComponentSpec] = &[VORO, STUBS, ATC, AWPMD, COLVARS, GPU, LINALG, MEAM, POEMS, SMD, VORONOI];
